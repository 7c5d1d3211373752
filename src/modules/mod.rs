pub mod content;
pub mod events;
pub mod new_launches;
pub mod newsletters;
pub mod shared;
pub mod tool_resources;
