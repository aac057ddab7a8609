//! The host-facing engine.
//!
//! [`Engine`] owns the open products, the options and the structure cache.
//! Every entry point resolves its argument list into a position first and
//! then produces a host value from it.

use std::path::Path;
use std::sync::Arc;

use common_config::{OptionName, QuarryConfig};
use common_error::{QuarryError, QuarryResult};
use quarry_core::shape::orient;
use quarry_core::time::{day2sec, time_to_string};
use quarry_core::{ArrayData, DataHandle, HostArray, HostValue, ProductHandle, Scalar, TypeClass};
use quarry_storage::{ExprType, Expression, JsonOpener, ProductOpener};

use crate::builder::{host_field_name, included_fields, StructCache};
use crate::materialize::Materializer;
use crate::multi::{self, FillMode};
use crate::registry::ProductRegistry;
use crate::resolve::{Position, Resolution, Resolver, WildcardMode};

/// Text reported for absent units and descriptions.
pub const NOT_AVAILABLE: &str = "not available";

// ============================================================================
// Engine
// ============================================================================

/// Materialization engine bound to one set of options and open products.
#[derive(Debug)]
pub struct Engine {
    config: QuarryConfig,
    registry: ProductRegistry,
    opener: Box<dyn ProductOpener>,
    cache: StructCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with default options reading JSON products.
    pub fn new() -> Self {
        Self::with_config(QuarryConfig::default())
    }

    pub fn with_config(config: QuarryConfig) -> Self {
        Self {
            config,
            registry: ProductRegistry::new(),
            opener: Box::new(JsonOpener),
            cache: StructCache::new(),
        }
    }

    /// Replace the product opener.
    pub fn with_opener(mut self, opener: impl ProductOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    pub fn config(&self) -> &QuarryConfig {
        &self.config
    }

    /// Number of currently open products.
    pub fn num_open_products(&self) -> usize {
        self.registry.len()
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.registry, self.config)
    }

    fn materializer(&mut self, product: ProductHandle) -> Materializer<'_> {
        Materializer::new(product, self.config.engine, &mut self.cache)
    }

    // ------------------------------------------------------------------------
    // Product lifecycle
    // ------------------------------------------------------------------------

    pub fn open(&mut self, path: impl AsRef<Path>) -> QuarryResult<ProductHandle> {
        let path = path.as_ref();
        let options = self.config.storage;
        let opener = &self.opener;
        let handle = self.registry.insert_with(|| opener.open(path, &options))?;
        log::debug!("opened {} as product {}", path.display(), handle);
        Ok(handle)
    }

    /// Open a product, requiring the given class, type and version (`-1`
    /// accepts any version).
    pub fn open_as(
        &mut self,
        path: impl AsRef<Path>,
        product_class: &str,
        product_type: &str,
        version: i32,
    ) -> QuarryResult<ProductHandle> {
        let path = path.as_ref();
        let options = self.config.storage;
        let opener = &self.opener;
        let handle = self.registry.insert_with(|| {
            opener.open_as(path, product_class, product_type, version, &options)
        })?;
        log::debug!(
            "opened {} as {}/{} product {}",
            path.display(),
            product_class,
            product_type,
            handle
        );
        Ok(handle)
    }

    pub fn close(&mut self, product_id: i64) -> QuarryResult<()> {
        let product = self.registry.remove(product_id)?;
        log::debug!("closed product {} ({})", product_id, product.filename());
        Ok(())
    }

    pub fn product_class(&self, product_id: i64) -> QuarryResult<String> {
        let (_, product) = self.registry.get(product_id)?;
        Ok(product.product_class().unwrap_or_default().to_string())
    }

    pub fn product_type(&self, product_id: i64) -> QuarryResult<String> {
        let (_, product) = self.registry.get(product_id)?;
        Ok(product.product_type().unwrap_or_default().to_string())
    }

    pub fn product_version(&self, product_id: i64) -> QuarryResult<i32> {
        let (_, product) = self.registry.get(product_id)?;
        Ok(product.product_version())
    }

    /// Close every open product and drop cached structure definitions.
    ///
    /// Products still referenced by data handles held elsewhere stay alive
    /// until those handles are dropped, but no longer resolve.
    pub fn unload(&mut self) {
        for (handle, product) in self.registry.drain() {
            let references = Arc::strong_count(&product) - 1;
            if references > 0 {
                log::warn!(
                    "product {} ({}) is still referenced by {} data handle(s) after unload",
                    handle,
                    product.filename(),
                    references
                );
            }
        }
        self.cache.clear();
    }

    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    // ------------------------------------------------------------------------
    // Data access
    // ------------------------------------------------------------------------

    /// Read the data item named by `args` into a host value.
    pub fn fetch(&mut self, args: &[HostValue]) -> QuarryResult<HostValue> {
        let resolution = self.resolver().resolve(args, WildcardMode::Defer)?;
        match resolution {
            Resolution::Single(Position { product, cursor }) => {
                self.materializer(product).materialize(&cursor)
            }
            Resolution::Multi(deferred) => {
                multi::fill(&deferred, &self.config.engine, FillMode::Values)
            }
        }
    }

    /// Data handle for the item named by `args`, or an array of handles for
    /// a wildcard selection.
    pub fn fetch_datahandle(&mut self, args: &[HostValue]) -> QuarryResult<HostValue> {
        let resolution = self.resolver().resolve(args, WildcardMode::Defer)?;
        match resolution {
            Resolution::Single(Position { product, cursor }) => {
                Ok(HostValue::from(DataHandle::new(product, cursor)))
            }
            Resolution::Multi(deferred) => {
                multi::fill(&deferred, &self.config.engine, FillMode::HandlesOnly)
            }
        }
    }

    /// Attribute record of the item named by `args`.
    pub fn attributes(&mut self, args: &[HostValue]) -> QuarryResult<HostValue> {
        let Position {
            product,
            mut cursor,
        } = self.resolver().resolve_single(args)?;
        cursor.goto_attributes()?;
        self.materializer(product).materialize(&cursor)
    }

    /// Evaluate an expression, optionally at the position named by `args`.
    pub fn eval(&mut self, source: &str, args: &[HostValue]) -> QuarryResult<HostValue> {
        let expression = Expression::parse(source)?;
        let position = if args.is_empty() {
            if !expression.is_constant() {
                return Err(QuarryError::ExpectedDataHandle);
            }
            None
        } else {
            Some(self.resolver().resolve_single(args)?)
        };
        let cursor = position.as_ref().map(|position| &position.cursor);
        let scalar = match expression.result_type() {
            ExprType::Boolean => Scalar::Int(i16::from(expression.eval_bool(cursor)?)),
            ExprType::Integer => Scalar::Long64(expression.eval_integer(cursor)?),
            ExprType::Float => Scalar::Double(expression.eval_float(cursor)?),
            ExprType::String => Scalar::String(expression.eval_string(cursor)?),
            ExprType::Node => {
                let Position { product, cursor } =
                    position.ok_or(QuarryError::ExpectedDataHandle)?;
                let target = expression.eval_node(&cursor)?;
                return Ok(HostValue::from(DataHandle::new(product, target)));
            }
            ExprType::Void => return Err(QuarryError::VoidExpressionNotSupported),
        };
        Ok(HostValue::Scalar(scalar))
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    /// Host-order extents of an array; `0` for anything else.
    pub fn size(&self, args: &[HostValue]) -> QuarryResult<HostValue> {
        let Position { cursor, .. } = self.resolver().resolve_single(args)?;
        if cursor.type_class() != TypeClass::Array {
            return Ok(HostValue::Scalar(Scalar::ULong(0)));
        }
        let dims = orient(&cursor.array_dims()?, self.config.engine.swap_dimensions);
        if dims.is_empty() {
            return Ok(HostValue::NoData);
        }
        let values = dims
            .iter()
            .map(|&extent| {
                u32::try_from(extent)
                    .map_err(|_| QuarryError::internal(format!("extent {extent} exceeds ULONG")))
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(HostValue::Array(HostArray::new(
            vec![values.len()],
            ArrayData::ULong(values),
        )?))
    }

    pub fn unit(&self, args: &[HostValue]) -> QuarryResult<String> {
        let Position { cursor, .. } = self.resolver().resolve_single(args)?;
        Ok(cursor
            .type_node()
            .unit
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()))
    }

    pub fn description(&self, args: &[HostValue]) -> QuarryResult<String> {
        let Position { cursor, .. } = self.resolver().resolve_single(args)?;
        Ok(cursor
            .type_node()
            .description
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()))
    }

    /// Whether the record named by all but the last argument has the field
    /// named by the last argument available.
    pub fn field_available(&self, args: &[HostValue]) -> QuarryResult<bool> {
        let (name, path) = args.split_last().ok_or(QuarryError::ExpectedDataHandle)?;
        let Position { cursor, .. } = self.resolver().resolve_single(path)?;
        if cursor.type_class() != TypeClass::Record {
            return Err(QuarryError::NotARecord(
                "arguments do not point to a record field".to_string(),
            ));
        }
        let name = match name {
            HostValue::Scalar(Scalar::String(name)) => name,
            HostValue::Array(array) if matches!(array.data, ArrayData::String(_)) => {
                return Err(QuarryError::wrong_selector())
            }
            _ => {
                return Err(QuarryError::WrongDataItemSelector(
                    "string argument expected".to_string(),
                ))
            }
        };
        let index = cursor.record_field_index(name)?;
        cursor.record_field_available(index)
    }

    /// Number of fields a fetch of the record would contain.
    pub fn field_count(&self, args: &[HostValue]) -> QuarryResult<usize> {
        let Position { cursor, .. } = self.resolver().resolve_single(args)?;
        if cursor.type_class() != TypeClass::Record {
            return Err(QuarryError::not_a_record());
        }
        Ok(included_fields(&cursor, &self.config.engine)?.len())
    }

    /// Upper-cased names of the fields a fetch of the record would contain;
    /// no-data when there are none.
    pub fn field_names(&self, args: &[HostValue]) -> QuarryResult<HostValue> {
        let Position { cursor, .. } = self.resolver().resolve_single(args)?;
        if cursor.type_class() != TypeClass::Record {
            return Err(QuarryError::not_a_record());
        }
        let node = Arc::clone(cursor.type_node());
        let fields = node.record_fields()?;
        let names: Vec<String> = included_fields(&cursor, &self.config.engine)?
            .into_iter()
            .map(|index| host_field_name(&fields[index].name))
            .collect();
        if names.is_empty() {
            return Ok(HostValue::NoData);
        }
        Ok(HostValue::Array(HostArray::new(
            vec![names.len()],
            ArrayData::String(names),
        )?))
    }

    // ------------------------------------------------------------------------
    // Options and helpers
    // ------------------------------------------------------------------------

    pub fn getopt(&self, name: &str) -> QuarryResult<bool> {
        let option: OptionName = name.parse()?;
        Ok(self.config.get(option))
    }

    /// Set an option, returning its previous value.
    pub fn setopt(&mut self, name: &str, value: bool) -> QuarryResult<bool> {
        let option: OptionName = name.parse()?;
        let previous = self.config.set(option, value);
        if matches!(
            option,
            OptionName::FilterRecordFields | OptionName::SwapDimensions | OptionName::UseSpecialTypes
        ) {
            self.cache.clear();
        }
        Ok(previous)
    }

    /// Format a numeric time value (seconds, or days with `TimeUnitDays`)
    /// relative to 2000-01-01.
    pub fn time_to_string(&self, value: &HostValue) -> QuarryResult<String> {
        let number = match value {
            HostValue::Scalar(scalar) => scalar.as_f64().ok_or(QuarryError::ExpectedScalar)?,
            _ => return Err(QuarryError::ExpectedScalar),
        };
        let seconds = if self.config.engine.time_unit_days {
            day2sec(number)
        } else {
            number
        };
        time_to_string(seconds)
    }
}

/// Whether a value is an error value with a nonzero code.
pub fn is_error(value: &HostValue) -> bool {
    value.is_error()
}

/// Whether a value is the no-data marker.
pub fn is_no_data(value: &HostValue) -> bool {
    value.is_no_data()
}
