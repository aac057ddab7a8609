//! Name-based entry points for scripting hosts.
//!
//! Hosts call routines by name with a list of host values and always get a
//! host value back; failures come back as error values rather than being
//! raised.

use common_error::{QuarryError, QuarryResult};
use quarry_core::{ErrorValue, HostValue, Scalar};

use crate::engine::{is_error, is_no_data, Engine};

type RoutineFn = fn(&mut Engine, &[HostValue]) -> QuarryResult<HostValue>;

/// A host-callable routine.
#[derive(Clone, Copy)]
pub struct Routine {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` accepts any number of trailing selectors.
    pub max_args: Option<usize>,
    func: RoutineFn,
}

impl std::fmt::Debug for Routine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Routine")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish()
    }
}

impl Routine {
    const fn new(name: &'static str, min_args: usize, max_args: Option<usize>, func: RoutineFn) -> Self {
        Self {
            name,
            min_args,
            max_args,
            func,
        }
    }

    fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }
}

/// Every routine, sorted by name.
pub static ROUTINES: &[Routine] = &[
    Routine::new("QUARRY_ATTRIBUTES", 1, None, |engine, args| engine.attributes(args)),
    Routine::new("QUARRY_CLOSE", 1, Some(1), close),
    Routine::new("QUARRY_DESCRIPTION", 1, None, |engine, args| {
        engine.description(args).map(HostValue::from)
    }),
    Routine::new("QUARRY_EVAL", 1, None, eval),
    Routine::new("QUARRY_FETCH", 1, None, |engine, args| engine.fetch(args)),
    Routine::new("QUARRY_FETCH_DATAHANDLE", 1, None, |engine, args| {
        engine.fetch_datahandle(args)
    }),
    Routine::new("QUARRY_FIELDAVAILABLE", 2, None, |engine, args| {
        engine.field_available(args).map(flag)
    }),
    Routine::new("QUARRY_FIELDCOUNT", 1, None, field_count),
    Routine::new("QUARRY_FIELDNAMES", 1, None, |engine, args| engine.field_names(args)),
    Routine::new("QUARRY_GETOPT", 1, Some(1), |engine, args| {
        engine.getopt(string_arg(&args[0])?).map(flag)
    }),
    Routine::new("QUARRY_IS_ERROR", 1, Some(1), |_, args| Ok(flag(is_error(&args[0])))),
    Routine::new("QUARRY_IS_NO_DATA", 1, Some(1), |_, args| {
        Ok(flag(is_no_data(&args[0])))
    }),
    Routine::new("QUARRY_OPEN", 1, Some(1), open),
    Routine::new("QUARRY_OPEN_AS", 4, Some(4), open_as),
    Routine::new("QUARRY_PRODUCT_CLASS", 1, Some(1), |engine, args| {
        engine.product_class(integer_arg(&args[0])?).map(HostValue::from)
    }),
    Routine::new("QUARRY_PRODUCT_TYPE", 1, Some(1), |engine, args| {
        engine.product_type(integer_arg(&args[0])?).map(HostValue::from)
    }),
    Routine::new("QUARRY_PRODUCT_VERSION", 1, Some(1), product_version),
    Routine::new("QUARRY_SETOPT", 2, Some(2), setopt),
    Routine::new("QUARRY_SIZE", 1, None, |engine, args| engine.size(args)),
    Routine::new("QUARRY_TIME_TO_STRING", 1, Some(1), |engine, args| {
        engine.time_to_string(&args[0]).map(HostValue::from)
    }),
    Routine::new("QUARRY_UNIT", 1, None, |engine, args| {
        engine.unit(args).map(HostValue::from)
    }),
    Routine::new("QUARRY_UNLOAD", 0, Some(0), |engine, _| {
        engine.unload();
        Ok(HostValue::Error(ErrorValue::success()))
    }),
    Routine::new("QUARRY_VERSION", 0, Some(0), |_, _| Ok(HostValue::from(Engine::version()))),
];

/// Look up a routine by case-insensitive name.
pub fn routine(name: &str) -> Option<&'static Routine> {
    ROUTINES
        .iter()
        .find(|routine| routine.name.eq_ignore_ascii_case(name))
}

// ============================================================================
// Argument helpers
// ============================================================================

fn flag(value: bool) -> HostValue {
    HostValue::Scalar(Scalar::Int(i16::from(value)))
}

fn string_arg(value: &HostValue) -> QuarryResult<&str> {
    match value {
        HostValue::Scalar(Scalar::String(text)) => Ok(text),
        _ => Err(QuarryError::invalid_argument("string argument expected")),
    }
}

fn integer_arg(value: &HostValue) -> QuarryResult<i64> {
    value
        .as_scalar()
        .and_then(Scalar::as_i64)
        .ok_or_else(|| QuarryError::invalid_argument("integer argument expected"))
}

fn close(engine: &mut Engine, args: &[HostValue]) -> QuarryResult<HostValue> {
    engine.close(integer_arg(&args[0])?)?;
    Ok(HostValue::Error(ErrorValue::success()))
}

fn open(engine: &mut Engine, args: &[HostValue]) -> QuarryResult<HostValue> {
    let handle = engine.open(string_arg(&args[0])?)?;
    Ok(HostValue::Scalar(Scalar::ULong64(handle.0)))
}

fn open_as(engine: &mut Engine, args: &[HostValue]) -> QuarryResult<HostValue> {
    let version = integer_arg(&args[3])?;
    let version = i32::try_from(version)
        .map_err(|_| QuarryError::invalid_argument(format!("version {version} out of range")))?;
    let handle = engine.open_as(
        string_arg(&args[0])?,
        string_arg(&args[1])?,
        string_arg(&args[2])?,
        version,
    )?;
    Ok(HostValue::Scalar(Scalar::ULong64(handle.0)))
}

fn product_version(engine: &mut Engine, args: &[HostValue]) -> QuarryResult<HostValue> {
    let version = engine.product_version(integer_arg(&args[0])?)?;
    // hosts receive a 16-bit integer
    let version = i16::try_from(version).unwrap_or(if version < 0 { i16::MIN } else { i16::MAX });
    Ok(HostValue::Scalar(Scalar::Int(version)))
}

fn field_count(engine: &mut Engine, args: &[HostValue]) -> QuarryResult<HostValue> {
    let count = engine.field_count(args)?;
    let count = i16::try_from(count)
        .map_err(|_| QuarryError::internal(format!("field count {count} exceeds INT")))?;
    Ok(HostValue::Scalar(Scalar::Int(count)))
}

fn eval(engine: &mut Engine, args: &[HostValue]) -> QuarryResult<HostValue> {
    let source = string_arg(&args[0])?;
    engine.eval(source, &args[1..])
}

fn setopt(engine: &mut Engine, args: &[HostValue]) -> QuarryResult<HostValue> {
    let value = integer_arg(&args[1])? != 0;
    engine.setopt(string_arg(&args[0])?, value).map(flag)
}

// ============================================================================
// Engine entry point
// ============================================================================

impl Engine {
    /// Call a routine by name.
    ///
    /// Unknown routines and wrong argument counts produce an
    /// invalid-argument error value.
    pub fn call(&mut self, name: &str, args: &[HostValue]) -> HostValue {
        let result = match routine(name) {
            Some(routine) if routine.accepts(args.len()) => (routine.func)(self, args),
            Some(routine) => Err(QuarryError::invalid_argument(format!(
                "wrong number of arguments ({}) for {}",
                args.len(),
                routine.name
            ))),
            None => Err(QuarryError::invalid_argument(format!(
                "unknown routine '{name}'"
            ))),
        };
        result.unwrap_or_else(|err| self.error_value(&err))
    }

    /// Error value for a failure, logged when the verbose option is on.
    pub fn error_value(&self, err: &QuarryError) -> HostValue {
        let value = ErrorValue::from(err);
        if self.config().engine.verbose {
            log::info!("QUARRY ERROR {}: \"{}\"", value.code, value.message);
        }
        HostValue::Error(value)
    }
}
