//! Array shape helpers shared by readers and materializers.
//!
//! Storage arrays are laid out row-major (last index varies fastest). Hosts
//! that expect column-major data either see the dimension list reversed, or
//! see the natural dimension list with the elements permuted; both are
//! expressed through the helpers here.

/// Maximum array rank a selector vector may address.
pub const MAX_NUM_DIMS: usize = 8;

/// Number of elements of an array with the given extents.
///
/// A rank-0 array holds one element.
pub fn num_elements(dims: &[usize]) -> usize {
    dims.iter().product()
}

/// Row-major subscripts of a linear index.
pub fn unravel(dims: &[usize], mut index: usize) -> Vec<usize> {
    let mut subscripts = vec![0; dims.len()];
    for (slot, &extent) in subscripts.iter_mut().zip(dims).rev() {
        if extent == 0 {
            continue;
        }
        *slot = index % extent;
        index /= extent;
    }
    subscripts
}

/// Map a row-major linear index to the column-major linear index of the
/// same element.
pub fn c_index_to_fortran_index(dims: &[usize], index: usize) -> usize {
    let subscripts = unravel(dims, index);
    let mut fortran = 0;
    let mut stride = 1;
    for (&sub, &extent) in subscripts.iter().zip(dims) {
        fortran += sub * stride;
        stride *= extent;
    }
    fortran
}

/// Put a per-dimension list into host order.
///
/// With swapping on, hosts see the natural order; otherwise the list is
/// reversed. The mapping is its own inverse.
pub fn orient<T: Clone>(values: &[T], swap_dimensions: bool) -> Vec<T> {
    if swap_dimensions {
        values.to_vec()
    } else {
        values.iter().rev().cloned().collect()
    }
}

/// Host extents for an array of the given natural extents.
///
/// Rank-0 arrays are presented as a single-element vector.
pub fn host_dims(natural: &[usize], swap_dimensions: bool) -> Vec<usize> {
    if natural.is_empty() {
        return vec![1];
    }
    orient(natural, swap_dimensions)
}
