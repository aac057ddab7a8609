//! Typed reads at a cursor position.
//!
//! Reads follow the widening rules of [`NativeReadType::widens_to`]: data
//! may be read into any type that holds every value of the stored type.
//! Special nodes are interpreted from their base data.

use common_error::{storage_err, QuarryError, QuarryResult};

use super::navigate::Cursor;
use super::product::LeafValue;
use crate::schema::{NativeReadType, SpecialType, TypeClass, TypeKind};
use crate::shape;
use crate::time;

/// Element order produced by bulk array reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOrdering {
    /// Storage order, last subscript varying fastest.
    C,
    /// First subscript varying fastest.
    Fortran,
}

macro_rules! integer_reader {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $read_type:expr) => {
        $(#[$doc])*
        pub fn $name(&self) -> QuarryResult<$ty> {
            let value = self.read_integer($read_type)?;
            <$ty>::try_from(value).map_err(|_| {
                QuarryError::invalid_type(format!(
                    "value {} does not fit in {}",
                    value, $read_type
                ))
            })
        }
    };
}

impl Cursor {
    fn unreadable(&self, target: &str) -> QuarryError {
        let stored = match self.type_node().read_type(self.options().perform_conversions) {
            Some(read_type) => read_type.name().to_string(),
            None => self.type_class().name().to_string(),
        };
        QuarryError::invalid_type(format!(
            "can not read {stored} data using a {target} data type"
        ))
    }

    fn leaf(&self) -> QuarryResult<LeafValue> {
        self.product().read_leaf(self.frame())
    }

    fn read_integer(&self, target: NativeReadType) -> QuarryResult<i128> {
        let stored = self.read_type().ok_or_else(|| self.unreadable(target.name()))?;
        if !stored.is_integer() || !stored.widens_to(target) {
            return Err(self.unreadable(target.name()));
        }
        self.leaf()?
            .as_i128()
            .ok_or_else(|| QuarryError::internal("integer node without integer data"))
    }

    integer_reader!(read_i8, i8, NativeReadType::Int8);
    integer_reader!(read_u8, u8, NativeReadType::Uint8);
    integer_reader!(read_i16, i16, NativeReadType::Int16);
    integer_reader!(read_u16, u16, NativeReadType::Uint16);
    integer_reader!(read_i32, i32, NativeReadType::Int32);
    integer_reader!(read_u32, u32, NativeReadType::Uint32);
    integer_reader!(read_i64, i64, NativeReadType::Int64);
    integer_reader!(
        /// Unsigned 64-bit read.
        read_u64,
        u64,
        NativeReadType::Uint64
    );

    pub fn read_f32(&self) -> QuarryResult<f32> {
        let stored = self.read_type().ok_or_else(|| self.unreadable("float"))?;
        if !stored.widens_to(NativeReadType::Float) {
            return Err(self.unreadable("float"));
        }
        let raw = self
            .leaf()?
            .as_f64()
            .ok_or_else(|| QuarryError::internal("numeric node without numeric data"))?;
        Ok(raw as f32)
    }

    /// Read as double, applying conversions and interpreting time and
    /// scaled-integer special nodes.
    pub fn read_f64(&self) -> QuarryResult<f64> {
        if self.type_class() == TypeClass::Special {
            return self.read_special_f64();
        }
        let node = self.type_node();
        let stored = self.read_type().ok_or_else(|| self.unreadable("double"))?;
        if !stored.widens_to(NativeReadType::Double) {
            return Err(self.unreadable("double"));
        }
        let raw = self
            .leaf()?
            .as_f64()
            .ok_or_else(|| QuarryError::internal("numeric node without numeric data"))?;
        match node.conversion() {
            Some(conversion) if self.options().perform_conversions => Ok(conversion.apply(raw)),
            _ => Ok(raw),
        }
    }

    fn read_special_f64(&self) -> QuarryResult<f64> {
        match self.special_type()? {
            SpecialType::Time => {
                let mut base = self.clone();
                base.goto_special_base()?;
                match base.type_class() {
                    TypeClass::Text => time::parse_time(&base.read_string()?),
                    _ => base.read_f64(),
                }
            }
            SpecialType::VsfInteger => {
                let mut base = self.clone();
                base.goto_special_base()?;
                let value_index = base.record_field_index("value")?;
                let scale_index = base.record_field_index("scale_factor")?;
                let mut value = base.clone();
                value.goto_record_field_by_index(value_index)?;
                let mut scale = base;
                scale.goto_record_field_by_index(scale_index)?;
                let scale = scale.read_i64()?;
                Ok(value.read_f64()? * 10f64.powi(-(scale as i32)))
            }
            other => Err(self.unreadable(&format!("double ({} special)", other.name()))),
        }
    }

    /// Read a complex special node as `(real, imaginary)`.
    pub fn read_complex(&self) -> QuarryResult<(f64, f64)> {
        if self.type_class() != TypeClass::Special || self.special_type()? != SpecialType::Complex
        {
            return Err(self.unreadable("complex"));
        }
        let mut base = self.clone();
        base.goto_special_base()?;
        let mut part = base.clone();
        match base.type_class() {
            TypeClass::Record => {
                part.goto_record_field_by_index(0)?;
                let re = part.read_f64()?;
                part.goto_next_record_field()?;
                Ok((re, part.read_f64()?))
            }
            TypeClass::Array => {
                part.goto_array_element_by_index(0)?;
                let re = part.read_f64()?;
                part.goto_next_array_element()?;
                Ok((re, part.read_f64()?))
            }
            _ => Err(self.unreadable("complex")),
        }
    }

    pub fn read_char(&self) -> QuarryResult<char> {
        if self.read_type() != Some(NativeReadType::Char) {
            return Err(self.unreadable("char"));
        }
        match self.leaf()? {
            LeafValue::Text(text) => Ok(text.chars().next().unwrap_or('\0')),
            _ => Err(QuarryError::internal("text node without text data")),
        }
    }

    pub fn read_string(&self) -> QuarryResult<String> {
        if self.type_class() != TypeClass::Text {
            return Err(self.unreadable("string"));
        }
        match self.leaf()? {
            LeafValue::Text(text) => Ok(text),
            _ => Err(QuarryError::internal("text node without text data")),
        }
    }

    pub fn string_length(&self) -> QuarryResult<usize> {
        Ok(self.read_string()?.len())
    }

    /// Read `length` bytes starting at `offset` within the current node.
    pub fn read_bytes(&self, offset: u64, length: u64) -> QuarryResult<Vec<u8>> {
        match &self.type_node().kind {
            TypeKind::Raw { .. } | TypeKind::Text { .. } => {
                self.product().read_bytes(self.frame(), offset, length)
            }
            _ => storage_err!(InvalidType: "can not read {} data as raw bytes", self.type_class()),
        }
    }

    /// Read every element of the array at the cursor, placed in the requested order.
    pub fn read_array<T, F>(&self, ordering: ArrayOrdering, mut read: F) -> QuarryResult<Vec<T>>
    where
        T: Default + Clone,
        F: FnMut(&Cursor) -> QuarryResult<T>,
    {
        let dims = self.array_dims()?;
        let count = shape::num_elements(&dims);
        let mut values = vec![T::default(); count];
        if count == 0 {
            return Ok(values);
        }
        let mut element = self.clone();
        element.goto_first_array_element()?;
        for i in 0..count {
            let position = match ordering {
                ArrayOrdering::C => i,
                ArrayOrdering::Fortran => shape::c_index_to_fortran_index(&dims, i),
            };
            values[position] = read(&element)?;
            if i + 1 < count {
                element.goto_next_array_element()?;
            }
        }
        Ok(values)
    }

    pub fn read_f64_array(&self, ordering: ArrayOrdering) -> QuarryResult<Vec<f64>> {
        self.read_array(ordering, Cursor::read_f64)
    }

    pub fn read_complex_array(&self, ordering: ArrayOrdering) -> QuarryResult<Vec<(f64, f64)>> {
        self.read_array(ordering, Cursor::read_complex)
    }
}
