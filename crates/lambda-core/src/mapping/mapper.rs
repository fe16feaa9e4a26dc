use std::collections::BTreeMap;

use lambda_model::{
    FunctionDescriptor, InferredAnnotation, MappingRequest, TaskAttribute, TaskLabelSchema,
};
use tracing::trace;

use crate::mapping::compat::is_compatible;

/// Validated correspondence between a function vocabulary and a task schema.
///
/// Entries that cannot be resolved against the schema are filtered out
/// rather than rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMapping {
    /// Function label to task label.
    labels: BTreeMap<String, String>,
    /// Function label to (function attribute to task attribute).
    attributes: BTreeMap<String, BTreeMap<String, String>>,
    /// Function label to (function attribute to the task attribute it lands in).
    supported: BTreeMap<String, BTreeMap<String, TaskAttribute>>,
}

impl ResolvedMapping {
    /// Build the mapping for one function against one task schema.
    ///
    /// Without a request (or with an empty one) every task label maps to
    /// itself and attributes are matched by identical name.
    pub fn resolve(
        function: &FunctionDescriptor,
        schema: &TaskLabelSchema,
        request: Option<&MappingRequest>,
    ) -> Self {
        let mut mapping = ResolvedMapping::default();

        match request.filter(|r| !r.is_empty()) {
            None => {
                for (name, label) in schema.iter() {
                    mapping.labels.insert(name.to_string(), name.to_string());
                    let identity = label
                        .attributes
                        .keys()
                        .map(|a| (a.clone(), a.clone()))
                        .collect();
                    mapping.attributes.insert(name.to_string(), identity);
                }
            }
            Some(request) => {
                for (func_label, entry) in request.iter() {
                    if !schema.contains(&entry.name) {
                        trace!(label = func_label, target = %entry.name, "mapping target is not in the task, dropped");
                        continue;
                    }
                    mapping
                        .labels
                        .insert(func_label.to_string(), entry.name.clone());
                    mapping
                        .attributes
                        .insert(func_label.to_string(), entry.attributes.clone());
                }
            }
        }

        for func_label in &function.labels {
            let Some(task_label) = mapping.labels.get(func_label) else {
                continue;
            };
            let Some(task_label) = schema.get(task_label) else {
                continue;
            };
            let mapped = mapping.attributes.get(func_label);

            let supported: BTreeMap<String, TaskAttribute> = function
                .attributes_of(func_label)
                .iter()
                .filter_map(|attr| {
                    let target = mapped?.get(&attr.name)?;
                    let spec = task_label.attributes.get(target)?;
                    Some((attr.name.clone(), spec.clone()))
                })
                .collect();
            mapping.supported.insert(func_label.clone(), supported);
        }

        mapping
    }

    /// Task label a function label maps to.
    pub fn task_label(&self, function_label: &str) -> Option<&str> {
        self.labels.get(function_label).map(String::as_str)
    }

    /// Task attribute a function attribute maps to, if the target exists in the task.
    pub fn supported_attribute(&self, function_label: &str, attribute: &str) -> Option<&TaskAttribute> {
        self.supported.get(function_label)?.get(attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Translate one detector result into task vocabulary.
    ///
    /// Returns `None` when the label is not mapped. Attributes that are not
    /// mapped, not declared by the function, or fail the compatibility check
    /// are dropped.
    pub fn remap(
        &self,
        function: &FunctionDescriptor,
        mut anno: InferredAnnotation,
    ) -> Option<InferredAnnotation> {
        let task_label = self.labels.get(&anno.label)?;
        let mapped = self.attributes.get(&anno.label);

        let attributes = std::mem::take(&mut anno.attributes);
        for mut attr in attributes {
            let Some(target) = mapped.and_then(|m| m.get(&attr.name)) else {
                continue;
            };
            let Some(declared) = function.attribute(&anno.label, &attr.name) else {
                continue;
            };
            let Some(spec) = self.supported_attribute(&anno.label, &attr.name) else {
                continue;
            };
            if is_compatible(&attr.value, declared.input_type, spec.input_type) {
                attr.name = target.clone();
                anno.attributes.push(attr);
            }
        }

        anno.label = task_label.clone();
        Some(anno)
    }
}
