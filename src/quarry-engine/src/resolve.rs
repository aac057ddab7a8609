//! Turning host argument lists into cursor positions.
//!
//! A call such as `fetch(pf, "records", -1, "x")` names a starting point
//! (a product id or a data handle) followed by a chain of selectors. The
//! chain is applied one selector at a time. A `-1` index marks a wildcard;
//! depending on the entry point it either defers the rest of the chain to
//! the multi-result filler or simply selects the first element.

use std::sync::Arc;

use common_config::QuarryConfig;
use common_error::{QuarryError, QuarryResult};
use quarry_core::shape::{orient, MAX_NUM_DIMS};
use quarry_core::{ArrayData, Cursor, HostValue, ProductHandle, Scalar, TypeClass};

use crate::registry::ProductRegistry;

/// Index value that selects every element along a dimension.
pub const WILDCARD: i64 = -1;

// ============================================================================
// Selectors
// ============================================================================

/// One step of a selector chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Record field by name.
    Field(String),
    /// Element of a one-dimensional array.
    Index(i64),
    /// Element of a multi-dimensional array, subscripts in host order.
    IndexVector(Vec<i64>),
}

impl Selector {
    /// Interpret a host value as a selector.
    pub fn from_host(value: &HostValue) -> QuarryResult<Self> {
        match value {
            HostValue::Scalar(Scalar::String(name)) => Ok(Self::Field(name.clone())),
            HostValue::Scalar(scalar) => match scalar.as_i64() {
                Some(index) => Ok(Self::Index(index)),
                None => Err(QuarryError::wrong_selector()),
            },
            HostValue::Array(array) if array.dims.len() == 1 && !array.is_empty() => {
                match array.data.to_i64_vec() {
                    Some(indices) => Ok(Self::IndexVector(indices)),
                    None => Err(QuarryError::wrong_selector()),
                }
            }
            _ => Err(QuarryError::wrong_selector()),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        match self {
            Self::Field(_) => false,
            Self::Index(index) => *index == WILDCARD,
            Self::IndexVector(indices) => indices.contains(&WILDCARD),
        }
    }

    /// Move `cursor` along this selector, reading wildcards as element 0.
    pub fn apply(&self, cursor: &mut Cursor, swap_dimensions: bool) -> QuarryResult<()> {
        match self {
            Self::Field(name) => goto_field(cursor, name),
            Self::Index(index) => {
                require_array(cursor)?;
                goto_index(cursor, first_if_wildcard(*index))
            }
            Self::IndexVector(indices) => {
                if indices.len() > MAX_NUM_DIMS {
                    return Err(QuarryError::WrongNumDimsArray);
                }
                require_array(cursor)?;
                let host: Vec<i64> = indices.iter().map(|&i| first_if_wildcard(i)).collect();
                cursor.goto_array_element(&orient(&host, swap_dimensions))
            }
        }
    }
}

/// Other negative indices are kept so navigation rejects them.
fn first_if_wildcard(index: i64) -> i64 {
    if index == WILDCARD {
        0
    } else {
        index
    }
}

fn goto_field(cursor: &mut Cursor, name: &str) -> QuarryResult<()> {
    let index = cursor.record_field_index(name)?;
    if !cursor.record_field_available(index)? {
        return Err(QuarryError::RecordFieldNotAvailable(name.to_string()));
    }
    cursor.goto_record_field_by_index(index)
}

fn require_array(cursor: &Cursor) -> QuarryResult<()> {
    if cursor.type_class() == TypeClass::Array {
        Ok(())
    } else {
        Err(QuarryError::WrongDataItemSelectorInteger)
    }
}

/// Single-integer selection: rank-0 arrays accept index 0, otherwise the
/// array must be one-dimensional.
fn goto_index(cursor: &mut Cursor, index: i64) -> QuarryResult<()> {
    let rank = cursor.type_node().array_dims()?.len();
    match rank {
        0 if index == 0 => cursor.goto_array_element(&[]),
        1 => cursor.goto_array_element(&[index]),
        _ => Err(QuarryError::ArrayNumDimsMismatch),
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// How a `-1` index is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardMode {
    /// Stop at the wildcard and hand the rest of the chain to the filler.
    Defer,
    /// Treat the wildcard as element 0.
    FirstElement,
}

/// A resolved single position.
#[derive(Debug, Clone)]
pub struct Position {
    pub product: ProductHandle,
    pub cursor: Cursor,
}

/// A wildcard selection waiting to be expanded.
#[derive(Debug, Clone)]
pub struct Deferred {
    pub product: ProductHandle,
    /// Cursor on the array holding the wildcard.
    pub array: Cursor,
    /// Per-dimension constraint in host order; `-1` accepts any subscript.
    pub pattern: Vec<i64>,
    /// Host-order extents of the result.
    pub result_dims: Vec<usize>,
    /// Selectors applied to every matching element.
    pub rest: Vec<Selector>,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Single(Position),
    Multi(Deferred),
}

/// Resolves argument lists against the open products.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a ProductRegistry,
    config: QuarryConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a ProductRegistry, config: QuarryConfig) -> Self {
        Self { registry, config }
    }

    /// Position named by the first argument.
    pub fn start(&self, first: &HostValue) -> QuarryResult<Position> {
        let handle = match first {
            HostValue::Handle(handle) => Some(handle.as_ref()),
            HostValue::Array(array) => match &array.data {
                ArrayData::Handle(handles) if handles.len() > 1 => {
                    return Err(QuarryError::ExpectedDataHandleGotArray)
                }
                ArrayData::Handle(handles) => match handles.first() {
                    Some(Some(handle)) => Some(handle),
                    _ => return Err(QuarryError::ExpectedDataHandle),
                },
                _ => return Err(QuarryError::ExpectedDataHandle),
            },
            HostValue::Scalar(scalar) => {
                let id = scalar.as_i64().ok_or(QuarryError::ExpectedDataHandle)?;
                let (product, opened) = self.registry.get(id)?;
                let cursor = Cursor::new(Arc::clone(opened), self.config.storage)?;
                return Ok(Position { product, cursor });
            }
            _ => return Err(QuarryError::ExpectedDataHandle),
        };
        match handle {
            Some(handle) => {
                self.registry.validate(handle)?;
                let mut cursor = handle.cursor.clone();
                cursor.set_options(self.config.storage)?;
                Ok(Position {
                    product: handle.product,
                    cursor,
                })
            }
            None => Err(QuarryError::ExpectedDataHandle),
        }
    }

    /// Resolve a full argument list.
    pub fn resolve(&self, args: &[HostValue], mode: WildcardMode) -> QuarryResult<Resolution> {
        let (first, selectors) = args.split_first().ok_or(QuarryError::ExpectedDataHandle)?;
        let Position {
            product,
            mut cursor,
        } = self.start(first)?;
        let swap = self.config.engine.swap_dimensions;
        // Set by a wildcard that reduced to the single element of a rank-0 array.
        let mut wildcard_seen = false;

        for (position, arg) in selectors.iter().enumerate() {
            let selector = Selector::from_host(arg)?;
            if mode == WildcardMode::Defer && selector.is_wildcard() {
                if wildcard_seen {
                    return Err(QuarryError::MultipleVariableIndices);
                }
                wildcard_seen = true;
                if let Some((pattern, result_dims)) = self.wildcard_shape(&cursor, &selector)? {
                    let rest = selectors[position + 1..]
                        .iter()
                        .map(Selector::from_host)
                        .collect::<QuarryResult<Vec<_>>>()?;
                    if rest.iter().any(Selector::is_wildcard) {
                        return Err(QuarryError::MultipleVariableIndices);
                    }
                    log::debug!(
                        "deferring wildcard selection at argument {} with result dims {:?}",
                        position + 1,
                        result_dims
                    );
                    return Ok(Resolution::Multi(Deferred {
                        product,
                        array: cursor,
                        pattern,
                        result_dims,
                        rest,
                    }));
                }
            }
            if mode == WildcardMode::Defer {
                if let Selector::IndexVector(indices) = &selector {
                    if indices.len() > MAX_NUM_DIMS {
                        return Err(QuarryError::WrongNumDimsArray);
                    }
                    require_array(&cursor)?;
                    if indices.len() != cursor.type_node().array_dims()?.len() {
                        return Err(QuarryError::WrongNumDimsArray);
                    }
                }
            }
            selector.apply(&mut cursor, swap)?;
        }
        Ok(Resolution::Single(Position { product, cursor }))
    }

    /// Resolve with wildcards read as element 0.
    pub fn resolve_single(&self, args: &[HostValue]) -> QuarryResult<Position> {
        match self.resolve(args, WildcardMode::FirstElement)? {
            Resolution::Single(position) => Ok(position),
            Resolution::Multi(_) => Err(QuarryError::internal(
                "wildcard deferred outside of a multi-result call",
            )),
        }
    }

    /// Constraint pattern and result extents of a wildcard selector, or
    /// `None` when the array is zero-dimensional and the wildcard reduces
    /// to its only element.
    fn wildcard_shape(
        &self,
        cursor: &Cursor,
        selector: &Selector,
    ) -> QuarryResult<Option<(Vec<i64>, Vec<usize>)>> {
        if let Selector::IndexVector(indices) = selector {
            if indices.len() > MAX_NUM_DIMS {
                return Err(QuarryError::WrongNumDimsArray);
            }
        }
        require_array(cursor)?;
        let swap = self.config.engine.swap_dimensions;
        match selector {
            Selector::Index(_) => {
                let dims = cursor.array_dims()?;
                match dims.len() {
                    0 => Ok(None),
                    1 => Ok(Some((vec![WILDCARD], dims))),
                    _ => Err(QuarryError::ArrayNumDimsMismatch),
                }
            }
            Selector::IndexVector(indices) => {
                let dims = cursor.array_dims()?;
                if indices.len() != dims.len() {
                    return Err(QuarryError::WrongNumDimsArray);
                }
                let host_dims = orient(&dims, swap);
                let result_dims = indices
                    .iter()
                    .zip(&host_dims)
                    .map(|(&index, &extent)| if index == WILDCARD { extent } else { 1 })
                    .collect();
                Ok(Some((indices.clone(), result_dims)))
            }
            Selector::Field(_) => Ok(None),
        }
    }
}
