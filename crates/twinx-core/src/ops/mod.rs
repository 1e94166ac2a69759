pub mod element_ops;
pub mod merge;
pub mod pagination;
pub mod path;
pub mod value;

pub use element_ops::{
    create_element, create_or_update_element, delete_element, element_value, parent_model_type,
    path_notation, resolve, resolve_container, resolve_element, update_element,
    update_element_value, Node,
};
pub use merge::{merge_shell, merge_submodel};
pub use pagination::{decode_cursor, encode_cursor, paginate, Page};
pub use path::{validate_id_short, IdShortPath, PathSegment};
