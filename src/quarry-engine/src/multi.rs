//! Expanding deferred wildcard selections into result arrays.

use common_config::EngineOptions;
use common_error::{QuarryError, QuarryResult, StorageErrorKind};
use quarry_core::shape::{c_index_to_fortran_index, num_elements, orient, unravel};
use quarry_core::{ArrayData, Cursor, DataHandle, HostArray, HostValue, NativeType};

use crate::classify::{classify_cursor, cursor_element_type, Classification};
use crate::resolve::{Deferred, WILDCARD};

/// Whether matches are read or only located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Leaves are read as scalars; compound nodes become data handles.
    Values,
    /// Every match becomes a data handle.
    HandlesOnly,
}

/// Natural linear indices of the array elements matching a host-order
/// pattern, in natural order.
pub fn matching_elements(dims: &[usize], pattern: &[i64], swap_dimensions: bool) -> Vec<usize> {
    (0..num_elements(dims))
        .filter(|&linear| {
            let host = orient(&unravel(dims, linear), swap_dimensions);
            pattern
                .iter()
                .zip(&host)
                .all(|(&want, &have)| want == WILDCARD || want == have as i64)
        })
        .collect()
}

/// Expand a deferred selection.
///
/// The element type follows the first match after the remaining selectors
/// have been applied. A wildcard over an empty array yields no-data.
pub fn fill(deferred: &Deferred, options: &EngineOptions, mode: FillMode) -> QuarryResult<HostValue> {
    let swap = options.swap_dimensions;
    let dims = deferred.array.array_dims()?;
    let count = num_elements(&deferred.result_dims);
    if count == 0 {
        return Ok(HostValue::NoData);
    }
    let matches = matching_elements(&dims, &deferred.pattern, swap);
    if matches.len() != count {
        return Err(QuarryError::storage(
            StorageErrorKind::ArrayOutOfBounds,
            format!(
                "array index {:?} exceeds array range {:?}",
                deferred.pattern,
                orient(&dims, swap)
            ),
        ));
    }

    let mut cursors = Vec::with_capacity(count);
    for linear in matches {
        let mut cursor = deferred.array.clone();
        cursor.goto_array_element_by_index(linear as i64)?;
        for selector in &deferred.rest {
            selector.apply(&mut cursor, swap)?;
        }
        cursors.push(cursor);
    }

    let native_type = match (mode, cursors.first()) {
        (FillMode::Values, Some(first)) => cursor_element_type(first)?,
        _ => NativeType::DataHandle,
    };
    let mut data = ArrayData::zeroed(&native_type, count)?;
    for (k, cursor) in cursors.into_iter().enumerate() {
        let position = if swap {
            c_index_to_fortran_index(&deferred.result_dims, k)
        } else {
            k
        };
        store(&mut data, position, cursor, deferred, options, mode)?;
    }
    log::debug!(
        "filled {} wildcard result with dims {:?}",
        data.type_name(),
        deferred.result_dims
    );
    Ok(HostValue::Array(HostArray::new(
        deferred.result_dims.clone(),
        data,
    )?))
}

fn store(
    data: &mut ArrayData,
    position: usize,
    cursor: Cursor,
    deferred: &Deferred,
    options: &EngineOptions,
    mode: FillMode,
) -> QuarryResult<()> {
    if mode == FillMode::Values {
        if let Classification::Leaf(kind) = classify_cursor(&cursor)? {
            if let Some(scalar) = kind.read(&cursor, options)? {
                data.set(position, scalar)?;
            }
            return Ok(());
        }
    }
    data.set_handle(position, DataHandle::new(deferred.product, cursor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_full_wildcard() {
        assert_eq!(
            matching_elements(&[2, 3], &[WILDCARD, WILDCARD], true),
            vec![0, 1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn test_matching_fixed_dimension() {
        // host order equals natural order: second natural subscript fixed to 1
        assert_eq!(matching_elements(&[2, 3], &[WILDCARD, 1], true), vec![1, 4]);
        // host order reversed: first host subscript is the last natural one
        assert_eq!(matching_elements(&[2, 3], &[1, WILDCARD], false), vec![1, 4]);
        assert_eq!(matching_elements(&[2, 3], &[WILDCARD, 1], false), vec![3, 4, 5]);
    }

    #[test]
    fn test_matching_out_of_range_constraint() {
        assert!(matching_elements(&[2, 3], &[WILDCARD, 7], true).is_empty());
    }
}
