//! Multi-step deployments expressed as an explicit plan.
//!
//! A [`DeploymentPlan`] is an ordered list of steps, each producing one named
//! role. Arguments may reference the address of an earlier role, an address
//! supplied from outside the plan, or an initializer call encoded against
//! another artifact. The whole plan is checked with placeholder addresses
//! before the first transaction is submitted, so a misconfigured plan never
//! leaves a half-finished deployment behind.

use std::{collections::BTreeMap, sync::Arc};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Address, Bytes, U256},
};
use tracing::info;

use crate::{
    artifacts::ContractArtifact,
    calldata::encode_params,
    client::ChainClient,
    errors::ScriptError,
    executor::deploy_contract,
    record::DeploymentRecord,
    types::{DeploymentRequest, DeploymentResult, TransactionOptions},
};

/// Where the value of a single argument comes from
#[derive(Debug, Clone)]
pub enum ArgSource {
    /// A literal value, which must match the parameter type exactly
    Value(DynSolValue),
    /// A literal parsed against the parameter type
    Text(String),
    /// The address produced by an earlier step
    Role(String),
    /// An address supplied to the plan from outside
    External(String),
    /// Calldata for `function` on `artifact`, passed as a `bytes` argument
    InitializerCall {
        /// The artifact whose ABI defines the function
        artifact: Arc<ContractArtifact>,
        /// The name of the function
        function: String,
        /// The arguments of the call
        args: Vec<ArgSource>,
    },
}

impl ArgSource {
    /// An address literal
    pub fn address(address: Address) -> Self {
        ArgSource::Value(DynSolValue::Address(address))
    }

    /// A `uint256` literal
    pub fn uint(value: U256) -> Self {
        ArgSource::Value(DynSolValue::Uint(value, 256))
    }

    /// A string literal
    pub fn string(value: impl Into<String>) -> Self {
        ArgSource::Value(DynSolValue::String(value.into()))
    }

    /// A reference to the address produced by an earlier step
    pub fn role(role: impl Into<String>) -> Self {
        ArgSource::Role(role.into())
    }

    /// A reference to an address supplied from outside the plan
    pub fn external(name: impl Into<String>) -> Self {
        ArgSource::External(name.into())
    }

    /// An initializer call encoded against `artifact`
    pub fn initializer(
        artifact: Arc<ContractArtifact>,
        function: impl Into<String>,
        args: Vec<ArgSource>,
    ) -> Self {
        ArgSource::InitializerCall {
            artifact,
            function: function.into(),
            args,
        }
    }
}

/// A single contract creation within a plan
#[derive(Debug, Clone)]
pub struct DeployStep {
    /// The role the deployed contract fills
    pub role: String,
    /// The contract to deploy
    pub artifact: Arc<ContractArtifact>,
    /// The constructor arguments
    pub args: Vec<ArgSource>,
    /// The overrides for the creation transaction
    pub options: TransactionOptions,
}

impl DeployStep {
    /// A step deploying `artifact` into `role`
    pub fn new(
        role: impl Into<String>,
        artifact: Arc<ContractArtifact>,
        args: Vec<ArgSource>,
    ) -> Self {
        Self {
            role: role.into(),
            artifact,
            args,
            options: TransactionOptions::default(),
        }
    }

    /// Set the transaction overrides of this step
    pub fn with_options(mut self, options: TransactionOptions) -> Self {
        self.options = options;
        self
    }
}

/// An ordered list of deployments
#[derive(Debug, Clone, Default)]
pub struct DeploymentPlan {
    /// The steps, in execution order
    steps: Vec<DeployStep>,
    /// Addresses supplied from outside the plan
    external: BTreeMap<String, Address>,
}

impl DeploymentPlan {
    /// An empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply an address the steps may reference by name
    pub fn with_external(mut self, name: impl Into<String>, address: Address) -> Self {
        self.external.insert(name.into(), address);
        self
    }

    /// Append a step
    pub fn with_step(mut self, step: DeployStep) -> Self {
        self.steps.push(step);
        self
    }

    /// The steps of the plan
    pub fn steps(&self) -> &[DeployStep] {
        &self.steps
    }

    /// Check the plan without submitting anything.
    ///
    /// Every step is resolved against placeholder addresses for the roles
    /// deployed before it, which catches duplicate roles, forward references,
    /// unknown externals, zero addresses, missing initializers and
    /// constructor arity or type mismatches.
    pub fn validate(&self) -> Result<(), ScriptError> {
        for (name, address) in &self.external {
            if address.is_zero() {
                return Err(ScriptError::Configuration(format!(
                    "external address `{name}` is zero"
                )));
            }
        }

        let mut deployed = BTreeMap::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.role.is_empty() {
                return Err(ScriptError::Configuration(format!("step {index} has no role")));
            }
            if deployed.contains_key(&step.role) || self.external.contains_key(&step.role) {
                return Err(ScriptError::Configuration(format!(
                    "role `{}` is produced more than once",
                    step.role
                )));
            }

            let args = self.resolve_step(step, &deployed)?;
            step.artifact
                .encode_constructor_args(&args)
                .map_err(|e| ScriptError::Configuration(format!("step `{}`: {e}", step.role)))?;

            deployed.insert(step.role.clone(), placeholder_address(index));
        }

        Ok(())
    }

    /// Validate the plan, then deploy every step in order.
    ///
    /// Execution stops at the first failure; no partial outcome is returned.
    pub async fn execute<C: ChainClient>(&self, client: &C) -> Result<PlanOutcome, ScriptError> {
        self.validate()?;

        let mut deployed = BTreeMap::new();
        let mut outcome = PlanOutcome::default();
        for step in &self.steps {
            let args = self.resolve_step(step, &deployed)?;
            let archive = encode_params(&args);

            let request = DeploymentRequest::new(step.artifact.name.clone(), args, step.options);
            let result = deploy_contract(client, &step.artifact, &request).await?;
            info!(role = %step.role, "{} fills `{}`", step.artifact.name, step.role);

            deployed.insert(step.role.clone(), result.address);
            outcome.push(&step.role, result, archive);
        }

        Ok(outcome)
    }

    /// Resolve the constructor arguments of a step against its constructor types
    fn resolve_step(
        &self,
        step: &DeployStep,
        deployed: &BTreeMap<String, Address>,
    ) -> Result<Vec<DynSolValue>, ScriptError> {
        let types = step.artifact.constructor_types()?;
        if types.len() != step.args.len() {
            return Err(ScriptError::Configuration(format!(
                "step `{}`: {} constructor expects {} arguments, got {}",
                step.role,
                step.artifact.name,
                types.len(),
                step.args.len()
            )));
        }

        step.args
            .iter()
            .zip(types.iter())
            .map(|(source, ty)| self.resolve(source, ty, deployed))
            .collect::<Result<_, _>>()
            .map_err(|e| match e {
                ScriptError::Configuration(msg) => {
                    ScriptError::Configuration(format!("step `{}`: {msg}", step.role))
                }
                other => other,
            })
    }

    /// Resolve a single argument against the parameter type it fills
    fn resolve(
        &self,
        source: &ArgSource,
        ty: &DynSolType,
        deployed: &BTreeMap<String, Address>,
    ) -> Result<DynSolValue, ScriptError> {
        let value = match source {
            ArgSource::Value(value) => {
                if !ty.matches(value) {
                    return Err(ScriptError::Configuration(format!(
                        "expected a value of type {ty}"
                    )));
                }
                value.clone()
            }
            ArgSource::Text(text) => ty
                .coerce_str(text)
                .map_err(|e| ScriptError::Configuration(format!("`{text}` is not a {ty}: {e}")))?,
            ArgSource::Role(role) => {
                expect_address(ty, role)?;
                let address = deployed.get(role).ok_or_else(|| {
                    ScriptError::Configuration(format!(
                        "`{role}` is not deployed by an earlier step"
                    ))
                })?;
                DynSolValue::Address(*address)
            }
            ArgSource::External(name) => {
                expect_address(ty, name)?;
                let address = self.external.get(name).ok_or_else(|| {
                    ScriptError::Configuration(format!("no external address named `{name}`"))
                })?;
                DynSolValue::Address(*address)
            }
            ArgSource::InitializerCall {
                artifact,
                function,
                args,
            } => {
                if ty != &DynSolType::Bytes {
                    return Err(ScriptError::Configuration(format!(
                        "initializer `{function}` fills a {ty} parameter, expected bytes"
                    )));
                }
                let types = artifact.function_types(function, args.len())?;
                let values = args
                    .iter()
                    .zip(types.iter())
                    .map(|(source, ty)| self.resolve(source, ty, deployed))
                    .collect::<Result<Vec<_>, _>>()?;
                let calldata = artifact.encode_function_call(function, &values)?;
                DynSolValue::Bytes(calldata.to_vec())
            }
        };

        if let DynSolValue::Address(address) = value {
            if address.is_zero() {
                return Err(ScriptError::Configuration("zero address argument".to_string()));
            }
        }
        Ok(value)
    }
}

/// Require that a role or external reference fills an `address` parameter
fn expect_address(ty: &DynSolType, name: &str) -> Result<(), ScriptError> {
    if ty != &DynSolType::Address {
        return Err(ScriptError::Configuration(format!(
            "`{name}` is an address but fills a {ty} parameter"
        )));
    }
    Ok(())
}

/// A stand-in for the address of the `index`th step during validation
fn placeholder_address(index: usize) -> Address {
    let mut bytes = [0xff; 20];
    bytes[12..].copy_from_slice(&(index as u64).to_be_bytes());
    Address::from(bytes)
}

/// The contracts deployed by a plan
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    /// The roles in deployment order
    order: Vec<String>,
    /// The confirmed deployments, keyed by role
    results: BTreeMap<String, DeploymentResult>,
    /// The encoded constructor arguments, keyed by role
    archives: BTreeMap<String, Bytes>,
}

impl PlanOutcome {
    /// Add a confirmed deployment
    fn push(&mut self, role: &str, result: DeploymentResult, archive: Bytes) {
        self.order.push(role.to_string());
        self.results.insert(role.to_string(), result);
        self.archives.insert(role.to_string(), archive);
    }

    /// The deployment filling `role`
    pub fn result(&self, role: &str) -> Option<&DeploymentResult> {
        self.results.get(role)
    }

    /// The address of the contract filling `role`
    pub fn address(&self, role: &str) -> Result<Address, ScriptError> {
        self.result(role)
            .map(|r| r.address)
            .ok_or_else(|| ScriptError::Configuration(format!("plan did not deploy `{role}`")))
    }

    /// The encoded constructor arguments of `role`
    pub fn archive(&self, role: &str) -> Option<&Bytes> {
        self.archives.get(role)
    }

    /// The roles deployed, in order
    pub fn roles(&self) -> &[String] {
        &self.order
    }

    /// Copy the addresses and non-empty argument archives into a record
    pub fn record_into(&self, record: &mut DeploymentRecord) {
        for role in &self.order {
            if let Some(result) = self.results.get(role) {
                record.set_address(role, result.address);
            }
            if let Some(archive) = self.archives.get(role).filter(|a| !a.is_empty()) {
                record.set_calldata(role, archive.clone());
            }
        }
    }
}
