//! Opening product files.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use common_config::StorageOptions;
use common_error::{QuarryError, QuarryResult, StorageErrorKind};
use quarry_core::Product;

use crate::memory::MemoryProduct;

/// Turns a path into an opened product.
pub trait ProductOpener: fmt::Debug + Send + Sync {
    fn open(&self, path: &Path, options: &StorageOptions) -> QuarryResult<Arc<dyn Product>>;

    /// Open a file and require it to be of the given class, type and
    /// version (`-1` accepts any version).
    fn open_as(
        &self,
        path: &Path,
        product_class: &str,
        product_type: &str,
        version: i32,
        options: &StorageOptions,
    ) -> QuarryResult<Arc<dyn Product>> {
        let product = self.open(path, options)?;
        let class_ok = product.product_class() == Some(product_class);
        let type_ok = product.product_type() == Some(product_type);
        let version_ok = version < 0 || product.product_version() == version;
        if class_ok && type_ok && version_ok {
            Ok(product)
        } else {
            Err(QuarryError::storage(
                StorageErrorKind::UnsupportedProduct,
                format!(
                    "{} is not a {}/{} product (version {}); found {}/{} version {}",
                    path.display(),
                    product_class,
                    product_type,
                    version,
                    product.product_class().unwrap_or(""),
                    product.product_type().unwrap_or(""),
                    product.product_version()
                ),
            ))
        }
    }
}

/// Opens JSON product descriptions as [`MemoryProduct`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOpener;

impl ProductOpener for JsonOpener {
    fn open(&self, path: &Path, options: &StorageOptions) -> QuarryResult<Arc<dyn Product>> {
        if options.use_mmap {
            log::debug!(
                "memory mapping not used for {}; JSON products are read whole",
                path.display()
            );
        }
        let product = MemoryProduct::open(path)?;
        Ok(Arc::new(product))
    }
}
