//! The mutable partial document and its generation-marker protocol.
//!
//! The document is the single owned tree the engine fills in, one slot at a
//! time. Between marking a slot and overwriting it with a concrete value,
//! the serialized document contains the marker exactly once; the marker's
//! position defines where [`PartialDocument::progress`] truncates the text
//! shown to the model. Slots are addressed by owned [`DocPath`] segments;
//! the engine never holds aliased references into the tree.

use serde_json::{Map, Value};

use crate::error::GenerateError;

/// Reserved sentinel occupying the one slot currently being generated.
pub const GENERATION_MARKER: &str = "|GENERATION|";

/// A path from the document root to a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct DocPath {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

impl DocPath {
    pub(crate) fn root() -> Self {
        Self::default()
    }

    fn child_key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Self { segments }
    }

    fn child_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }
}

/// The in-progress document tree, rooted at an object.
#[derive(Debug)]
pub(crate) struct PartialDocument {
    root: Value,
}

impl PartialDocument {
    pub(crate) fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Serialized document text, marker included. Test/trace introspection.
    #[cfg(test)]
    pub(crate) fn text(&self) -> String {
        self.root.to_string()
    }

    /// Serialized document truncated immediately before the marker's
    /// opening quote: the "document so far" shown to the model.
    ///
    /// # Errors
    ///
    /// [`GenerateError::MarkerNotFound`] unless the serialized text contains
    /// exactly one marker occurrence.
    pub(crate) fn progress(&self) -> Result<String, GenerateError> {
        let serialized = self.root.to_string();
        let needle = format!("\"{GENERATION_MARKER}\"");
        let mut indices = serialized.match_indices(&needle).map(|(index, _)| index);
        let first = indices.next();
        let found = first.map_or(0, |_| 1 + indices.count());
        match first {
            Some(index) if found == 1 => Ok(serialized[..index].to_string()),
            _ => Err(GenerateError::MarkerNotFound { found }),
        }
    }

    /// Place the marker at `container[key]`, creating the slot.
    pub(crate) fn set_field_marker(&mut self, container: &DocPath, key: &str) {
        self.object_mut(container)
            .insert(key.to_string(), marker_value());
    }

    /// Overwrite `container[key]` (the marker slot) with a concrete value.
    pub(crate) fn write_field(&mut self, container: &DocPath, key: &str, value: Value) {
        self.object_mut(container).insert(key.to_string(), value);
    }

    /// Append the marker as a new trailing element of the array at `path`.
    pub(crate) fn push_marker(&mut self, array: &DocPath) {
        self.array_mut(array).push(marker_value());
    }

    /// Remove a trailing marker previously appended by [`Self::push_marker`].
    pub(crate) fn pop_marker(&mut self, array: &DocPath) {
        let popped = self.array_mut(array).pop();
        debug_assert!(
            matches!(&popped, Some(Value::String(s)) if s == GENERATION_MARKER),
            "pop_marker removed a non-marker element: {popped:?}"
        );
    }

    /// Overwrite the last element of the array at `path` with a concrete
    /// value.
    pub(crate) fn write_last_element(&mut self, array: &DocPath, value: Value) {
        let items = self.array_mut(array);
        let last = items
            .last_mut()
            .expect("write_last_element follows a marker push, so the array is never empty");
        *last = value;
    }

    /// Insert an empty object at `container[key]` (or append one when the
    /// container is an array), returning the new node's path.
    pub(crate) fn insert_object(&mut self, container: &DocPath, key: Option<&str>) -> DocPath {
        self.insert_node(container, key, Value::Object(Map::new()))
    }

    /// Insert an empty array at `container[key]` (or append one when the
    /// container is an array), returning the new node's path.
    pub(crate) fn insert_array(&mut self, container: &DocPath, key: Option<&str>) -> DocPath {
        self.insert_node(container, key, Value::Array(Vec::new()))
    }

    fn insert_node(&mut self, container: &DocPath, key: Option<&str>, node: Value) -> DocPath {
        match key {
            Some(key) => {
                self.object_mut(container).insert(key.to_string(), node);
                container.child_key(key)
            }
            None => {
                let items = self.array_mut(container);
                items.push(node);
                container.child_index(items.len() - 1)
            }
        }
    }

    fn node_mut(&mut self, path: &DocPath) -> &mut Value {
        let mut node = &mut self.root;
        for segment in &path.segments {
            node = match segment {
                Segment::Key(key) => node.as_object_mut().and_then(|map| map.get_mut(key)),
                Segment::Index(index) => node.as_array_mut().and_then(|items| items.get_mut(*index)),
            }
            .expect("document paths are handed out at node creation and always resolve");
        }
        node
    }

    fn object_mut(&mut self, path: &DocPath) -> &mut Map<String, Value> {
        self.node_mut(path)
            .as_object_mut()
            .expect("path addresses an object container")
    }

    fn array_mut(&mut self, path: &DocPath) -> &mut Vec<Value> {
        self.node_mut(path)
            .as_array_mut()
            .expect("path addresses an array container")
    }
}

fn marker_value() -> Value {
    Value::String(GENERATION_MARKER.to_string())
}
