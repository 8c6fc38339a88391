pub mod books;
pub mod status;

use std::sync::Arc;

use bookshelf_cache::CacheHandle;
use bookshelf_kernel::ModuleRegistry;

use books::store::BookStore;

/// Register every application module, wiring in the shared adapters
pub fn register_all(registry: &mut ModuleRegistry, store: Arc<dyn BookStore>, cache: CacheHandle) {
    registry.register(status::create_module(cache.clone()));
    registry.register(books::create_module(store, cache));
}
