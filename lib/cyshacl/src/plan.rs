use crate::constraint::ConstraintKind;
use crate::template::Scope;
use graphconf::Properties;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One compiled violation query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    id: String,
    global: String,
    scoped: String,
    triggers: Vec<String>,
    kind: ConstraintKind,
    focus_label: String,
    path: Option<String>,
}

impl PlanEntry {
    /// `Q_1`, `Q_2`…
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn query(&self, scope: Scope) -> &str {
        match scope {
            Scope::Global => &self.global,
            Scope::Touched => &self.scoped,
        }
    }

    /// Labels that make the scoped query worth running when carried by a touched node.
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn focus_label(&self) -> &str {
        &self.focus_label
    }

    /// The property or relationship the query is about, `None` for node-level constraints.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

/// An entry of the inventory of compiled constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintComponent {
    pub focus_label: String,
    pub path: Option<String>,
    /// See [`ConstraintKind::kind_name`].
    pub kind: String,
    pub value: Value,
}

/// The result of a compilation: the queries, the parameter sets they read and the constraint inventory.
///
/// Each query binds its parameter set with `WITH $`<set id>` as params`,
/// so the parameter sets are expected to be passed as query parameters keyed by their id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorPlan {
    entries: Vec<PlanEntry>,
    params: BTreeMap<String, Properties>,
    inventory: Vec<ConstraintComponent>,
}

impl ValidatorPlan {
    /// The queries, in emission order.
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Parameter sets, keyed by `<shape id>_<constraint parameter IRI>`.
    pub fn params(&self) -> &BTreeMap<String, Properties> {
        &self.params
    }

    pub fn inventory(&self) -> &[ConstraintComponent] {
        &self.inventory
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All the queries of `scope` as a single `UNION` query.
    ///
    /// Empty if the plan is empty.
    pub fn union_query(&self, scope: Scope) -> String {
        self.entries
            .iter()
            .map(|e| e.query(scope))
            .collect::<Vec<_>>()
            .join(" UNION ")
    }

    /// The entries having at least one trigger among `labels`.
    pub fn entries_triggered_by<L: AsRef<str>>(&self, labels: &[L]) -> Vec<&PlanEntry> {
        self.entries
            .iter()
            .filter(|e| {
                e.triggers
                    .iter()
                    .any(|t| labels.iter().any(|l| l.as_ref() == t))
            })
            .collect()
    }

    pub(crate) fn push_query(
        &mut self,
        triggers: Vec<String>,
        kind: ConstraintKind,
        focus_label: &str,
        path: Option<&str>,
        global: String,
        scoped: String,
    ) -> &PlanEntry {
        let id = format!("Q_{}", self.entries.len() + 1);
        self.entries.push(PlanEntry {
            id,
            global,
            scoped,
            triggers,
            kind,
            focus_label: focus_label.into(),
            path: path.map(Into::into),
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Sets `key` in the parameter set `set_id`, creating the set if needed.
    pub(crate) fn set_param(&mut self, set_id: &str, key: &str, value: Value) {
        self.params
            .entry(set_id.into())
            .or_default()
            .insert(key.into(), value);
    }

    pub(crate) fn push_component(&mut self, component: ConstraintComponent) {
        self.inventory.push(component);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan() -> ValidatorPlan {
        let mut plan = ValidatorPlan::default();
        plan.push_query(
            vec!["A".into()],
            ConstraintKind::MinCount,
            "A",
            Some("p"),
            "MATCH (focus:`A`) WHERE true RETURN 1".into(),
            "MATCH (focus:`A`) WHERE  focus IN $touchedNodes AND true RETURN 1".into(),
        );
        plan.push_query(
            vec!["A".into(), "B".into()],
            ConstraintKind::Class,
            "A",
            Some("q"),
            "MATCH (focus:`A`) WHERE false RETURN 2".into(),
            "MATCH (focus:`A`) WHERE  focus IN $touchedNodes AND false RETURN 2".into(),
        );
        plan
    }

    #[test]
    fn ids_follow_emission_order() {
        let plan = plan();
        assert_eq!(
            plan.entries().iter().map(PlanEntry::id).collect::<Vec<_>>(),
            ["Q_1", "Q_2"]
        );
        assert_eq!(plan.entry("Q_2").map(PlanEntry::kind), Some(ConstraintKind::Class));
    }

    #[test]
    fn union() {
        assert_eq!(
            plan().union_query(Scope::Global),
            "MATCH (focus:`A`) WHERE true RETURN 1 UNION MATCH (focus:`A`) WHERE false RETURN 2"
        );
        assert_eq!(ValidatorPlan::default().union_query(Scope::Touched), "");
    }

    #[test]
    fn triggered_entries() {
        fn ids(plan: &ValidatorPlan, labels: &[&str]) -> Vec<String> {
            plan.entries_triggered_by(labels)
                .into_iter()
                .map(|e| e.id().to_owned())
                .collect()
        }

        let plan = plan();
        assert_eq!(ids(&plan, &["B"]), ["Q_2"]);
        assert_eq!(ids(&plan, &["A", "C"]), ["Q_1", "Q_2"]);
        assert!(ids(&plan, &["C"]).is_empty());
    }

    #[test]
    fn parameter_sets_are_merged() {
        let mut plan = ValidatorPlan::default();
        plan.set_param("s_p", "theHasValueUri", json!(["http://example.org/a"]));
        plan.set_param("s_p", "theHasValueLiteral", json!(["a"]));
        assert_eq!(plan.params().len(), 1);
        assert_eq!(plan.params()["s_p"].len(), 2);
    }

    #[test]
    fn serialization() {
        let json = serde_json::to_value(plan()).unwrap();
        assert_eq!(json["entries"][1]["focusLabel"], json!("A"));
        assert_eq!(json["entries"][1]["kind"], json!("class"));
        assert_eq!(json["entries"][1]["triggers"], json!(["A", "B"]));
    }
}
