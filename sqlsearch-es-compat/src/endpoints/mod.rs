//! ES-compatible API endpoints

pub mod bulk;
pub mod cluster;
pub mod index;
pub mod mapping;
pub mod msearch;
pub mod search;
pub mod template;

pub use bulk::bulk_handler;
pub use cluster::{cat_indices_handler, cluster_health_handler, head_handler, root_handler};
pub use index::{create_index_handler, index_document_handler};
pub use mapping::mapping_handler;
pub use msearch::msearch_handler;
pub use search::search_handler;
pub use template::{get_template_handler, list_templates_handler, put_template_handler};

use sqlsearch::SearchEngine;
use std::sync::Arc;

/// State for ES compat handlers
#[derive(Clone)]
pub struct EsCompatState {
    pub engine: Arc<SearchEngine>,
}
