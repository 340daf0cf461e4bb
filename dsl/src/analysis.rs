//! Annotations attached to syntax tree nodes by the analysis passes.
//!
//! Passes communicate through annotations rather than by mutating the
//! tree: the constant folding pass records a [ConstValue] per expression
//! node, the candidate data type pass records the list of types a node
//! could yield, and the narrowing pass records the single chosen type
//! together with the call resolution results. Each pass writes its own
//! annotation kind and never overwrites another pass's writes.
use std::collections::{HashMap, HashSet};

use crate::common::TypeName;
use crate::constant::ConstValue;
use crate::core::NodeId;

const NO_CANDIDATES: &[TypeName] = &[];

/// The annotation store, keyed by node identity.
#[derive(Debug, Default)]
pub struct AnnotationMap {
    consts: HashMap<NodeId, ConstValue>,
    candidates: HashMap<NodeId, Vec<TypeName>>,
    types: HashMap<NodeId, TypeName>,
    called_function: HashMap<NodeId, usize>,
    extensible_param_count: HashMap<NodeId, usize>,
    deprecated: HashSet<NodeId>,
}

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The constant value of the node, if the folding pass computed one.
    pub fn const_value(&self, id: NodeId) -> Option<&ConstValue> {
        self.consts.get(&id)
    }

    /// The constant value of the node, or the all-undefined value when
    /// the folding pass left no annotation.
    pub fn const_value_or_default(&self, id: NodeId) -> ConstValue {
        self.consts.get(&id).cloned().unwrap_or_default()
    }

    pub fn set_const_value(&mut self, id: NodeId, value: ConstValue) {
        self.consts.insert(id, value);
    }

    /// The ordered list of data types the node could yield. Absent means
    /// the candidate pass found none.
    pub fn candidates(&self, id: NodeId) -> &[TypeName] {
        self.candidates
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(NO_CANDIDATES)
    }

    pub fn has_candidates(&self, id: NodeId) -> bool {
        !self.candidates(id).is_empty()
    }

    pub fn set_candidates(&mut self, id: NodeId, candidates: Vec<TypeName>) {
        self.candidates.insert(id, candidates);
    }

    /// The single data type chosen for the node, if narrowing succeeded.
    pub fn datatype(&self, id: NodeId) -> Option<&TypeName> {
        self.types.get(&id)
    }

    pub fn set_datatype(&mut self, id: NodeId, datatype: TypeName) {
        self.types.insert(id, datatype);
    }

    /// For call nodes: the index of the overload chosen among the
    /// declarations registered under the callee name.
    pub fn called_function(&self, id: NodeId) -> Option<usize> {
        self.called_function.get(&id).copied()
    }

    pub fn set_called_function(&mut self, id: NodeId, overload_index: usize) {
        self.called_function.insert(id, overload_index);
    }

    /// For calls of extensible standard functions: how many values were
    /// passed to the extensible parameter.
    pub fn extensible_param_count(&self, id: NodeId) -> Option<usize> {
        self.extensible_param_count.get(&id).copied()
    }

    pub fn set_extensible_param_count(&mut self, id: NodeId, count: usize) {
        self.extensible_param_count.insert(id, count);
    }

    /// Whether the chosen overload is flagged as deprecated.
    pub fn is_deprecated(&self, id: NodeId) -> bool {
        self.deprecated.contains(&id)
    }

    pub fn set_deprecated(&mut self, id: NodeId) {
        self.deprecated.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Slot;
    use crate::core::NodeIdGen;

    #[test]
    fn candidates_when_absent_then_empty() {
        let mut gen = NodeIdGen::new();
        let map = AnnotationMap::new();
        assert!(map.candidates(gen.next()).is_empty());
    }

    #[test]
    fn const_value_when_set_then_read_back() {
        let mut gen = NodeIdGen::new();
        let id = gen.next();
        let mut map = AnnotationMap::new();
        let mut value = ConstValue::new();
        value.int64 = Slot::Valid(5);
        map.set_const_value(id, value.clone());
        assert_eq!(map.const_value(id), Some(&value));
        assert_eq!(map.const_value_or_default(gen.next()), ConstValue::new());
    }

    #[test]
    fn datatype_when_not_narrowed_then_none() {
        let mut gen = NodeIdGen::new();
        let id = gen.next();
        let mut map = AnnotationMap::new();
        map.set_candidates(id, vec![TypeName::Int, TypeName::Uint]);
        assert!(map.has_candidates(id));
        assert_eq!(map.datatype(id), None);
    }
}
