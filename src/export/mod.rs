//! Export codecs: CSV tables, zip archives, and the encrypted container

pub mod archive;
pub mod container;
pub mod csv;

pub use archive::{
    attachment_entry_name, create_archive, create_locked_archive, decrypt_archive,
    is_locked_archive, read_archive, ArchiveEntry,
};
pub use container::{
    create_container, open_container, validate_pin, Container, ContainerVersion,
    MAX_CONTAINER_BYTES,
};
pub use csv::{
    decode_categories, decode_items, decode_vaults, encode_categories, encode_items,
    encode_vaults, items_file_name, kind_from_file_name, parse_rows,
};
