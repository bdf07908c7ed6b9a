//! 基于 `html5ever` 引用计数 DOM 的 HTML 解析工具

pub mod dom;

pub use dom::{find_nodes, get_node_attr, get_node_name, has_class, parse_html, text_content};
