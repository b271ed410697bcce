//! Binding of notation arguments to contract interfaces.
//!
//! `Interface` wraps a JSON ABI and turns an [`ArgumentSpec`] into calldata
//! for one of its functions (or its constructor), and raw return data back
//! into [`ArgValue`]s. The packing itself is done by `alloy::dyn_abi`; this
//! layer only checks that the function exists, that every declared type is
//! one the notation can express, that the arity matches and that each
//! notation tag matches its parameter. Codec errors are passed through,
//! tagged with the function name.
//!
//! The free functions [`encode`], [`encode_notation`], [`decode`] and
//! [`decode_hex`] parse the interface description on every call.

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier},
    hex,
    json_abi::{Function, JsonAbi, Param},
    primitives::Bytes,
};

use crate::{
    error::CodecError,
    notation::{serialize_return, ArgType, ArgValue, ArgumentSpec, ReturnValue},
};

// ============================================================================
// CallDescriptor
// ============================================================================

/// A function name together with its parsed arguments.
///
/// An empty function name designates the constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallDescriptor {
    pub function: String,
    pub args: ArgumentSpec,
}

impl CallDescriptor {
    pub fn new(function: impl Into<String>, args: ArgumentSpec) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }

    /// Parse `notation` into the arguments of `function`.
    pub fn parse(function: impl Into<String>, notation: &str) -> Result<Self, CodecError> {
        Ok(Self::new(function, ArgumentSpec::parse(notation)?))
    }

    pub fn constructor(args: ArgumentSpec) -> Self {
        Self::new(String::new(), args)
    }

    pub fn is_constructor(&self) -> bool {
        self.function.is_empty()
    }
}

// ============================================================================
// Interface
// ============================================================================

/// A parsed contract interface description.
#[derive(Debug, Clone)]
pub struct Interface {
    abi: JsonAbi,
}

impl Interface {
    /// Parse a JSON ABI document.
    pub fn parse(json: &str) -> Result<Self, CodecError> {
        let abi = serde_json::from_str::<JsonAbi>(json).map_err(CodecError::Interface)?;
        Ok(Self { abi })
    }

    pub fn from_abi(abi: JsonAbi) -> Self {
        Self { abi }
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Encode a call to `function`, or constructor arguments when `function`
    /// is empty. Function calls are prefixed with the selector.
    pub fn encode(&self, function: &str, args: &ArgumentSpec) -> Result<Bytes, CodecError> {
        if function.is_empty() {
            return self.encode_constructor(args);
        }

        let func = self.function_with_arity(function, args.len())?;
        let values = bind_args(function, &func.inputs, args)?;
        let encoded = func
            .abi_encode_input(&values)
            .map_err(|source| CodecError::Encode {
                function: function.to_string(),
                source,
            })?;

        tracing::trace!(function, len = encoded.len(), "encoded call");
        Ok(encoded.into())
    }

    pub fn encode_call(&self, call: &CallDescriptor) -> Result<Bytes, CodecError> {
        self.encode(&call.function, &call.args)
    }

    /// Creation payload: `bytecode` followed by the encoded constructor arguments.
    pub fn deploy_data(&self, bytecode: &[u8], args: &ArgumentSpec) -> Result<Bytes, CodecError> {
        let encoded = self.encode_constructor(args)?;
        let mut data = Vec::with_capacity(bytecode.len() + encoded.len());
        data.extend_from_slice(bytecode);
        data.extend_from_slice(&encoded);
        Ok(data.into())
    }

    fn encode_constructor(&self, args: &ArgumentSpec) -> Result<Bytes, CodecError> {
        let Some(constructor) = self.abi.constructor() else {
            // No declared constructor means no arguments
            if args.is_empty() {
                return Ok(Bytes::new());
            }
            return Err(CodecError::ArityMismatch {
                function: String::new(),
                expected: 0,
                found: args.len(),
            });
        };

        if constructor.inputs.len() != args.len() {
            return Err(CodecError::ArityMismatch {
                function: String::new(),
                expected: constructor.inputs.len(),
                found: args.len(),
            });
        }
        let values = bind_args("", &constructor.inputs, args)?;
        constructor
            .abi_encode_input(&values)
            .map(Bytes::from)
            .map_err(|source| CodecError::Encode {
                function: String::new(),
                source,
            })
    }

    /// Decode the return data of `function`.
    pub fn decode(&self, function: &str, data: &[u8]) -> Result<Vec<ArgValue>, CodecError> {
        let func = self.function_by_name(function)?;
        declared_types(function, &func.outputs)?;

        let values = func
            .abi_decode_output(data)
            .map_err(|source| CodecError::Decode {
                function: function.to_string(),
                source,
            })?;

        values
            .into_iter()
            .zip(&func.outputs)
            .map(|(value, param)| {
                from_sol_value(value).ok_or_else(|| CodecError::UnsupportedType {
                    function: function.to_string(),
                    ty: param.ty.clone(),
                })
            })
            .collect()
    }

    /// Decode the return data of `function` and pair each value with its
    /// declared type name.
    pub fn decode_labeled(
        &self,
        function: &str,
        data: &[u8],
    ) -> Result<Vec<ReturnValue>, CodecError> {
        let values = self.decode(function, data)?;
        Ok(serialize_return(&self.output_types(function)?, values))
    }

    /// Declared output type names of `function`.
    pub fn output_types(&self, function: &str) -> Result<Vec<String>, CodecError> {
        let func = self.function_by_name(function)?;
        Ok(func.outputs.iter().map(|p| p.ty.clone()).collect())
    }

    fn function_by_name(&self, name: &str) -> Result<&Function, CodecError> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| CodecError::UnknownFunction(name.to_string()))
    }

    /// First overload of `name` taking `arity` arguments.
    fn function_with_arity(&self, name: &str, arity: usize) -> Result<&Function, CodecError> {
        let overloads = self
            .abi
            .function(name)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| CodecError::UnknownFunction(name.to_string()))?;

        overloads
            .iter()
            .find(|f| f.inputs.len() == arity)
            .ok_or_else(|| CodecError::ArityMismatch {
                function: name.to_string(),
                expected: overloads[0].inputs.len(),
                found: arity,
            })
    }
}

/// Check the notation tags against the declared parameters and convert the
/// values for the codec.
fn bind_args(
    function: &str,
    params: &[Param],
    args: &ArgumentSpec,
) -> Result<Vec<DynSolValue>, CodecError> {
    let declared = declared_types(function, params)?;

    for (index, (expected, arg)) in declared.iter().zip(args).enumerate() {
        if *expected != arg.ty {
            return Err(CodecError::TypeMismatch {
                function: function.to_string(),
                index,
                expected: params[index].ty.clone(),
                found: arg.ty,
            });
        }
    }

    Ok(args.values().cloned().map(DynSolValue::from).collect())
}

/// Map declared parameters to notation types, rejecting anything the
/// notation cannot express.
fn declared_types(function: &str, params: &[Param]) -> Result<Vec<ArgType>, CodecError> {
    params
        .iter()
        .map(|param| {
            param
                .resolve()
                .ok()
                .and_then(|ty| arg_type_of(&ty))
                .ok_or_else(|| CodecError::UnsupportedType {
                    function: function.to_string(),
                    ty: param.ty.clone(),
                })
        })
        .collect()
}

fn arg_type_of(ty: &DynSolType) -> Option<ArgType> {
    match ty {
        DynSolType::Uint(256) => Some(ArgType::Uint256),
        DynSolType::Bytes => Some(ArgType::Bytes),
        DynSolType::FixedBytes(32) => Some(ArgType::Bytes32),
        DynSolType::String => Some(ArgType::String),
        DynSolType::Address => Some(ArgType::Address),
        DynSolType::Array(inner) => match arg_type_of(inner)? {
            ArgType::Uint256 => Some(ArgType::Uint256Array),
            ArgType::Bytes => Some(ArgType::BytesArray),
            ArgType::Bytes32 => Some(ArgType::Bytes32Array),
            ArgType::Address => Some(ArgType::AddressArray),
            _ => None,
        },
        _ => None,
    }
}

// ============================================================================
// Value conversion
// ============================================================================

impl From<ArgValue> for DynSolValue {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Uint(v) => DynSolValue::Uint(v, 256),
            ArgValue::Bytes(v) => DynSolValue::Bytes(v.to_vec()),
            ArgValue::FixedBytes(v) => DynSolValue::FixedBytes(v, 32),
            ArgValue::String(v) => DynSolValue::String(v),
            ArgValue::Address(v) => DynSolValue::Address(v),
            ArgValue::Array(items) => {
                DynSolValue::Array(items.into_iter().map(DynSolValue::from).collect())
            }
        }
    }
}

fn from_sol_value(value: DynSolValue) -> Option<ArgValue> {
    match value {
        DynSolValue::Uint(v, 256) => Some(ArgValue::Uint(v)),
        DynSolValue::Bytes(v) => Some(ArgValue::Bytes(v.into())),
        DynSolValue::FixedBytes(v, 32) => Some(ArgValue::FixedBytes(v)),
        DynSolValue::String(v) => Some(ArgValue::String(v)),
        DynSolValue::Address(v) => Some(ArgValue::Address(v)),
        DynSolValue::Array(items) => items
            .into_iter()
            .map(from_sol_value)
            .collect::<Option<Vec<_>>>()
            .map(ArgValue::Array),
        _ => None,
    }
}

// ============================================================================
// One-shot helpers
// ============================================================================

/// Encode `args` for `function` of the interface described by `abi_json`.
pub fn encode(abi_json: &str, function: &str, args: &ArgumentSpec) -> Result<Bytes, CodecError> {
    Interface::parse(abi_json)?.encode(function, args)
}

/// Parse `notation` and encode it for `function`.
pub fn encode_notation(abi_json: &str, function: &str, notation: &str) -> Result<Bytes, CodecError> {
    let args = ArgumentSpec::parse(notation)?;
    encode(abi_json, function, &args)
}

/// Decode the return data of `function`.
pub fn decode(abi_json: &str, function: &str, data: &[u8]) -> Result<Vec<ArgValue>, CodecError> {
    Interface::parse(abi_json)?.decode(function, data)
}

/// Decode return data given as a hex string, with or without `0x`.
pub fn decode_hex(
    abi_json: &str,
    function: &str,
    data: &str,
) -> Result<Vec<ArgValue>, CodecError> {
    let data = hex::decode(data).map_err(|e| CodecError::ReturnData(e.to_string()))?;
    decode(abi_json, function, &data)
}
