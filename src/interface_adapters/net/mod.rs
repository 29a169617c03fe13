// Network adapter modules split by client sockets vs area management routes.

pub mod client;
pub mod internal;

pub use client::{spawn_area_serializer, ws_handler};
pub use internal::{
    area_command_handler, create_area_handler, delete_area_handler, get_area_handler,
    list_areas_handler,
};
