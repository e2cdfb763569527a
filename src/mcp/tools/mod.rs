//! The five-tool catalog exposed by the Tool-Calling Server (spec §4.5).

pub mod edit_file;
pub mod outline;
pub mod session_manager;
pub mod smart_search;
pub mod write_file;

use super::protocol::Tool;

pub fn catalog() -> Vec<Tool> {
    vec![
        session_manager::tool_definition(),
        write_file::tool_definition(),
        edit_file::tool_definition(),
        smart_search::tool_definition(),
        outline::tool_definition(),
    ]
}
