//! Page/Pages tree helpers: inherited attribute lookup (spec.md §3's
//! `MediaBox`/`Resources`/`Rotate` "walk the parent chain" rule) and the
//! Catalog-flattening traversal shared by `crate::read`'s `CatalogHandler`.
//!
//! Grounded on `Page.resources`/`Page.media_box`'s `inherit()` walk in the
//! teacher (examples/pdf-rs-pdf/pdf/src/object/types/page.rs) and on the
//! exact preorder-DFS flattening algorithm in
//! `ReadRootDictionaryTransformer.transform` from the teacher's Python
//! ancestor (`ptext/io/read/page/read_root_dictionary_transformer.py`).

use crate::object::document::Document;
use crate::primitive::Value;

/// A handful of page attributes are inheritable: if a `Page` dictionary
/// doesn't carry `key` itself, its `/Parent` (and its parent's `/Parent`,
/// ...) is consulted until one does, or the chain runs out.
pub fn inherited_attribute<'a>(doc: &'a Document, page: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = page;
    loop {
        if let Some(value) = current.as_dict().and_then(|d| d.get(key)) {
            return Some(value);
        }
        current = doc.parent_of(current)?;
    }
}

/// Depth-first, preorder walk of a `/Pages` node's `/Kids` array,
/// collecting every leaf `/Page` dictionary in document order. This is the
/// traversal `CatalogHandler` runs once at read time to replace a
/// `Catalog`'s nested `Pages` tree with a single flat list (spec.md §4.2 /
/// §8.1's end-to-end scenario); `front-pop` order in the teacher's Python
/// ancestor is preorder because kids are appended to the to-visit list in
/// array order and popped from the front.
pub fn flatten_pages(doc: &Document, pages_root: &Value) -> Vec<Value> {
    use std::collections::VecDeque;

    let mut leaves = Vec::new();
    let mut queue: VecDeque<Value> = VecDeque::new();
    queue.push_back(pages_root.clone());

    // `pop_front` + "push kids back to the front" reproduces the teacher
    // ancestor's `stack_to_handle.pop(0)` preorder traversal: a Pages
    // node's kids are visited before any sibling that was already queued
    // behind it.
    while let Some(node) = queue.pop_front() {
        let node = match node.as_reference() {
            Some(r) => match doc.resolve(r) {
                Ok(v) => v.clone(),
                Err(_) => continue,
            },
            None => node,
        };
        let is_pages = node.as_dict().is_some_and(|d| d.is_type("Type", "Pages"));
        if is_pages {
            if let Some(kids) = node.as_dict().and_then(|d| d.get("Kids")).and_then(Value::as_array) {
                for kid in kids.iter().rev() {
                    queue.push_front(kid.clone());
                }
            }
        } else {
            leaves.push(node);
        }
    }
    leaves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{Dictionary, Reference};

    fn page(label: &str) -> Value {
        let mut d = Dictionary::new();
        d.insert("Type", Value::name("Page"));
        d.insert("Label", Value::name(label));
        Value::dictionary(d)
    }

    fn pages(kids: Vec<Value>) -> Value {
        let mut d = Dictionary::new();
        d.insert("Type", Value::name("Pages"));
        d.insert("Kids", Value::array(kids));
        Value::dictionary(d)
    }

    #[test]
    fn flattens_nested_pages_tree_in_preorder() {
        let doc = Document::new();
        let tree = pages(vec![page("1"), pages(vec![page("2"), page("3")]), page("4")]);
        let leaves = flatten_pages(&doc, &tree);
        let labels: Vec<&str> = leaves.iter().map(|p| p.as_dict().unwrap().get("Label").unwrap().as_name().unwrap()).collect();
        assert_eq!(labels, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn inherited_attribute_walks_parent_chain() {
        let mut doc = Document::new();
        let parent_ref = Reference { object_number: 1, generation_number: 0 };
        let mut parent_dict = Dictionary::new();
        parent_dict.insert("MediaBox", Value::array(vec![Value::integer(0); 4]));
        doc.insert(parent_ref, Value::dictionary(parent_dict));

        let child = page("1");
        child.set_parent(parent_ref);
        assert!(inherited_attribute(&doc, &child, "MediaBox").is_some());
        assert!(inherited_attribute(&doc, &child, "Rotate").is_none());
    }
}
