use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 解析已解码的 HTML 页面
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

/// 按标签路径查找元素，如 `["div", "h2"]`
///
/// 最后一个标签可以位于前面标签下的任意深度。
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some((&node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    let matches = get_node_name(node) == Some(node_name);

    if matches && rest.is_empty() {
        found_nodes.push(node.clone());
    }

    let next_names = if matches && !rest.is_empty() {
        rest
    } else {
        node_names
    };

    for child_node in node.children.borrow().iter() {
        found_nodes.append(&mut find_nodes(child_node, next_names));
    }

    found_nodes
}

pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 元素的 class 列表是否包含 `class_name`
pub fn has_class(node: &Handle, class_name: &str) -> bool {
    get_node_attr(node, "class")
        .map(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

/// 拼接后代文本节点，每个节点先去掉首尾空白
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { ref contents } = node.data {
        out.push_str(contents.borrow().trim());
    }
    for child_node in node.children.borrow().iter() {
        collect_text(child_node, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div class="card"><h2 class="card-title big">ਇੱਕ <b>ਦੋ</b></h2></div>
        <h2 class="subtitle">skip</h2>
        <section><div><h2 class="card-title">ਤਿੰਨ</h2></div></section>
    </body></html>"#;

    #[test]
    fn test_find_nodes_at_any_depth() {
        let dom = parse_html(PAGE);
        assert_eq!(find_nodes(&dom.document, &["h2"]).len(), 3);
        assert_eq!(find_nodes(&dom.document, &["section", "h2"]).len(), 1);
    }

    #[test]
    fn test_has_class_checks_class_list() {
        let dom = parse_html(PAGE);
        let titles: Vec<_> = find_nodes(&dom.document, &["h2"])
            .into_iter()
            .filter(|node| has_class(node, "card-title"))
            .collect();
        assert_eq!(titles.len(), 2);
    }

    #[test]
    fn test_text_content_joins_trimmed_parts() {
        let dom = parse_html(PAGE);
        let first = &find_nodes(&dom.document, &["h2"])[0];
        assert_eq!(text_content(first), "ਇੱਕਦੋ");
        assert_eq!(
            get_node_attr(first, "class").as_deref(),
            Some("card-title big")
        );
    }
}
