//! Service definitions and the method table.
//!
//! Remote operations are plain trait methods. Each one is installed into a
//! [`MethodTable`] under its `Service.Method` name; the table owns argument
//! decoding and result encoding so handlers only see typed values.

use std::collections::HashMap;
use std::sync::Arc;

use bitcode::{Decode, Encode};

use crate::rpc::error::{RegistryError, ServiceError};
use crate::rpc::protocol::{CallArguments, CallResult, MULTIPLY_METHOD};

/// The `Calculator` service.
pub trait Calculator: Send + Sync {
    /// Multiply `A` by `B`. `None` models a call that carried no arguments.
    fn multiply(&self, args: Option<CallArguments>) -> Result<CallResult, ServiceError>;
}

/// Stateless calculator; overflow is reported instead of wrapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct Arith;

impl Calculator for Arith {
    fn multiply(&self, args: Option<CallArguments>) -> Result<CallResult, ServiceError> {
        let args = args.ok_or(ServiceError::InvalidArguments)?;
        let result = args.a.checked_mul(args.b).ok_or(ServiceError::Overflow {
            a: args.a,
            b: args.b,
        })?;
        Ok(CallResult { result })
    }
}

type MethodHandler = Box<dyn Fn(&[u8]) -> Result<Vec<u8>, ServiceError> + Send + Sync>;

/// Explicit registry of callable methods keyed by `Service.Method`.
#[derive(Default)]
pub struct MethodTable {
    methods: HashMap<String, MethodHandler>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed handler.
    ///
    /// An empty request body reaches the handler as `None`.
    pub fn register<A, R, F>(&mut self, name: &str, handler: F) -> Result<(), RegistryError>
    where
        A: for<'de> Decode<'de> + 'static,
        R: Encode + 'static,
        F: Fn(Option<A>) -> Result<R, ServiceError> + Send + Sync + 'static,
    {
        match name.split_once('.') {
            Some((service, method)) if !service.is_empty() && !method.is_empty() => {}
            _ => return Err(RegistryError::InvalidName(name.to_string())),
        }
        if self.methods.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        let erased: MethodHandler = Box::new(move |body: &[u8]| {
            let args = if body.is_empty() {
                None
            } else {
                let decoded = bitcode::decode::<A>(body)
                    .map_err(|e| ServiceError::MalformedArguments(e.to_string()))?;
                Some(decoded)
            };
            let reply = handler(args)?;
            Ok(bitcode::encode(&reply))
        });
        self.methods.insert(name.to_string(), erased);
        Ok(())
    }

    /// Run the named method against an encoded argument body.
    pub fn dispatch(&self, name: &str, body: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let handler = self
            .methods
            .get(name)
            .ok_or_else(|| ServiceError::UnknownMethod(name.to_string()))?;
        handler(body)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Install every `Calculator` method.
pub fn register_calculator<C>(table: &mut MethodTable, calculator: Arc<C>) -> Result<(), RegistryError>
where
    C: Calculator + 'static,
{
    table.register(MULTIPLY_METHOD, move |args: Option<CallArguments>| {
        calculator.multiply(args)
    })
}

/// The method table served by default.
pub fn default_method_table() -> Result<MethodTable, RegistryError> {
    let mut table = MethodTable::new();
    register_calculator(&mut table, Arc::new(Arith))?;
    Ok(table)
}
