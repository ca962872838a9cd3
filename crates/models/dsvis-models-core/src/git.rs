//! Simplified git commit graph.
//!
//! Commits are nodes (`c<n>`), parent links are `git` edges. Branch tips and
//! HEAD are label nodes (`{sid}_label_<n>`, showing `HEAD` or the branch name)
//! that never get coordinates from the model: moving one is a SET_LABEL
//! carrying `attach_to`. Commits and labels draw from the same counter.

use dsvis_timeline_core::{AnimationOp, AnimationStep, Timeline, VisualState};
use indexmap::IndexMap;
use serde_json::{json, Value as JsonValue};

use crate::args;
use crate::error::ModelError;
use crate::ids::IdAllocator;
use crate::{ModelOp, Payload, StructureKind};

const EDGE_KIND: &str = "git";
const HEAD_LABEL: &str = "HEAD";
const DEFAULT_BRANCH: &str = "main";

#[derive(Clone, Debug, PartialEq)]
pub struct GitCommit {
    pub message: String,
    pub parents: Vec<String>,
    /// Branch checked out when the commit was made; `None` when detached.
    pub branch: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Head {
    Branch(String),
    Detached(String),
}

impl Head {
    /// Branch name or commit id, as exported.
    pub fn name(&self) -> &str {
        match self {
            Head::Branch(name) | Head::Detached(name) => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitGraphModel {
    structure_id: String,
    ids: IdAllocator,
    commits: IndexMap<String, GitCommit>,
    /// Branch name -> tip; `None` until the first commit on that branch.
    branches: IndexMap<String, Option<String>>,
    head: Option<Head>,
    /// Branch name -> label node id.
    branch_labels: IndexMap<String, String>,
    head_label: Option<String>,
}

impl GitGraphModel {
    pub fn new(structure_id: impl Into<String>, ids: IdAllocator) -> Self {
        Self {
            structure_id: structure_id.into(),
            ids,
            commits: IndexMap::new(),
            branches: IndexMap::new(),
            head: None,
            branch_labels: IndexMap::new(),
            head_label: None,
        }
    }

    pub fn structure_id(&self) -> &str {
        &self.structure_id
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn head(&self) -> Option<&Head> {
        self.head.as_ref()
    }

    pub fn commit_ids(&self) -> impl Iterator<Item = &str> {
        self.commits.keys().map(String::as_str)
    }

    pub fn commit(&self, id: &str) -> Option<&GitCommit> {
        self.commits.get(id)
    }

    pub fn branch_tip(&self, name: &str) -> Option<&str> {
        self.branches.get(name).and_then(|tip| tip.as_deref())
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }

    /// Node id of the label showing `name`.
    pub fn branch_label(&self, name: &str) -> Option<&str> {
        self.branch_labels.get(name).map(String::as_str)
    }

    pub fn head_label(&self) -> Option<&str> {
        self.head_label.as_deref()
    }

    /// Commits only; labels are not counted.
    pub fn node_count(&self) -> usize {
        self.commits.len()
    }

    pub fn apply_operation(&mut self, op: ModelOp, payload: &Payload) -> Result<Timeline, ModelError> {
        let name = op.as_str();
        match op {
            ModelOp::Create | ModelOp::Init => self.init(payload),
            ModelOp::DeleteAll => Ok(self.delete_all()),
            ModelOp::Commit => {
                let message = match args::opt_scalar(payload, "message", name)? {
                    Some(m) => Some(m),
                    None => args::opt_scalar(payload, "value", name)?,
                };
                let message = message.map_or_else(|| "commit".to_string(), |m| m.label());
                self.commit_on_head(message)
            }
            ModelOp::Checkout => {
                let target = args::opt_str(payload, "target", name)?
                    .ok_or_else(|| ModelError::missing(name, "target"))?;
                Ok(self.checkout(target))
            }
            ModelOp::Branch => {
                let branch = args::opt_str(payload, "name", name)?
                    .ok_or_else(|| ModelError::missing(name, "name"))?;
                self.branch(branch)
            }
            other => Err(ModelError::UnsupportedOperation {
                kind: StructureKind::Git.as_str().to_string(),
                op: other.as_str().to_string(),
            }),
        }
    }

    /// `{commits: [{id, message, parents, branch}], branches, head}`
    pub fn export_state(&self) -> Payload {
        let commits: Vec<JsonValue> = self
            .commits
            .iter()
            .map(|(id, c)| {
                json!({
                    "id": id,
                    "message": c.message,
                    "parents": c.parents,
                    "branch": c.branch,
                })
            })
            .collect();
        let branches: serde_json::Map<String, JsonValue> = self
            .branches
            .iter()
            .map(|(name, tip)| (name.clone(), json!(tip)))
            .collect();

        let mut state = Payload::new();
        state.insert("commits".into(), JsonValue::Array(commits));
        state.insert("branches".into(), JsonValue::Object(branches));
        state.insert(
            "head".into(),
            self.head
                .as_ref()
                .map_or(JsonValue::Null, |h| JsonValue::from(h.name())),
        );
        state
    }

    /// Fresh repository, or a restore when the payload carries `commits`/`branches`.
    pub fn init(&mut self, payload: &Payload) -> Result<Timeline, ModelError> {
        let restoring = ["commits", "branches"]
            .iter()
            .any(|key| payload.get(*key).map_or(false, |v| !v.is_null()));
        if restoring {
            let snapshot = Snapshot::parse(payload)?;
            let mut tl = self.delete_all();
            tl.extend(self.restore(snapshot));
            return Ok(tl);
        }

        let mut tl = self.delete_all();
        self.branches.insert(DEFAULT_BRANCH.to_string(), None);
        self.head = Some(Head::Branch(DEFAULT_BRANCH.to_string()));
        let main = self.new_branch_label(DEFAULT_BRANCH);
        let head = self.new_head_label();
        tl.add_step(AnimationStep::labeled(
            "Init",
            vec![AnimationOp::message("git init"), main, head],
        ));
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        Ok(tl)
    }

    /// Append a commit on top of whatever HEAD resolves to.
    pub fn commit_on_head(&mut self, message: String) -> Result<Timeline, ModelError> {
        let head = self
            .head
            .clone()
            .ok_or_else(|| ModelError::state("HEAD is not set; run git init first"))?;
        let sid = self.structure_id.clone();
        let parent = self.head_commit().map(str::to_string);
        let id = format!("c{}", self.ids.alloc_raw());

        let mut ops = vec![AnimationOp::message(format!("commit: {message}"))];
        if let Some(p) = &parent {
            ops.push(AnimationOp::set_state(&sid, p.as_str(), VisualState::Highlight));
        }
        ops.push(
            AnimationOp::create_node(&sid, id.as_str())
                .with("label", message.clone())
                .with("shape", "circle")
                .with("kind", "commit"),
        );
        if let Some(p) = &parent {
            ops.push(self.edge_op(p, &id));
        }

        let branch = match &head {
            Head::Branch(name) => {
                self.branches.insert(name.clone(), Some(id.clone()));
                if let Some(label) = self.branch_labels.get(name) {
                    ops.push(move_label(&sid, label, name, &id));
                }
                self.head = Some(Head::Branch(name.clone()));
                Some(name.clone())
            }
            Head::Detached(_) => {
                self.head = Some(Head::Detached(id.clone()));
                None
            }
        };
        if let Some(label) = &self.head_label {
            ops.push(move_label(&sid, label, HEAD_LABEL, &id));
        }
        self.commits.insert(
            id,
            GitCommit {
                message,
                parents: parent.iter().cloned().collect(),
                branch,
            },
        );

        let mut tl = Timeline::new();
        tl.add_step(AnimationStep::labeled("Commit", ops));
        let mut restore = vec![AnimationOp::clear_message()];
        if let Some(p) = &parent {
            restore.push(AnimationOp::set_state(&sid, p.as_str(), VisualState::Normal));
        }
        tl.add_step(AnimationStep::labeled("Restore", restore));
        Ok(tl)
    }

    /// Re-anchor HEAD to a branch or, detached, to a commit id.
    pub fn checkout(&mut self, target: &str) -> Timeline {
        let sid = self.structure_id.clone();
        let mut tl = Timeline::new();
        if let Some(tip) = self.branches.get(target) {
            let mut ops = vec![AnimationOp::message(format!("checkout {target}"))];
            if let (Some(tip), Some(label)) = (tip, &self.head_label) {
                ops.push(move_label(&sid, label, HEAD_LABEL, tip));
            }
            self.head = Some(Head::Branch(target.to_string()));
            tl.add_step(AnimationStep::labeled("Checkout branch", ops));
        } else if self.commits.contains_key(target) {
            let mut ops = vec![AnimationOp::message(format!("checkout {target} (detached)"))];
            if let Some(label) = &self.head_label {
                ops.push(move_label(&sid, label, HEAD_LABEL, target));
            }
            tl.add_step(AnimationStep::labeled("Checkout detached", ops));
            self.head = Some(Head::Detached(target.to_string()));
        } else {
            tl.add_step(AnimationStep::labeled(
                "Checkout",
                vec![AnimationOp::message("Target not found")],
            ));
        }
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        tl
    }

    /// New branch label at the commit HEAD resolves to. HEAD does not move.
    pub fn branch(&mut self, name: &str) -> Result<Timeline, ModelError> {
        if name.is_empty() {
            return Err(ModelError::invalid(ModelOp::Branch.as_str(), "name", "branch name is empty"));
        }
        let tip = self
            .head_commit()
            .map(str::to_string)
            .ok_or_else(|| ModelError::state("cannot branch before the first commit"))?;
        let sid = self.structure_id.clone();
        let mut tl = Timeline::new();
        if self.branches.contains_key(name) {
            tl.add_step(AnimationStep::labeled(
                "Branch",
                vec![AnimationOp::message(format!("Branch {name} already exists"))],
            ));
        } else {
            let create = self.new_branch_label(name);
            let mut ops = vec![AnimationOp::message(format!("branch {name}")), create];
            if let Some(label) = self.branch_labels.get(name) {
                ops.push(move_label(&sid, label, name, &tip));
            }
            tl.add_step(AnimationStep::labeled("Branch", ops));
            self.branches.insert(name.to_string(), Some(tip));
        }
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        Ok(tl)
    }

    pub fn delete_all(&mut self) -> Timeline {
        let mut tl = Timeline::new();
        if self.head.is_none() && self.commits.is_empty() && self.branches.is_empty() {
            return tl;
        }
        let sid = self.structure_id.clone();
        let mut ops = vec![AnimationOp::message("Deleting all git structures")];
        for (id, commit) in &self.commits {
            for parent in &commit.parents {
                ops.push(AnimationOp::delete_edge(
                    &sid,
                    IdAllocator::edge_id(&sid, EDGE_KIND, parent, id),
                    parent,
                    id,
                ));
            }
        }
        if let Some(label) = self.head_label.take() {
            ops.push(AnimationOp::delete_node(&sid, label));
        }
        ops.extend(
            self.branch_labels
                .drain(..)
                .map(|(_, label)| AnimationOp::delete_node(&sid, label)),
        );
        ops.extend(self.commits.keys().map(|id| AnimationOp::delete_node(&sid, id.as_str())));

        self.commits.clear();
        self.branches.clear();
        self.head = None;
        tl.add_step(AnimationStep::labeled("Delete all", ops));
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        tl
    }

    /// Commit HEAD resolves to, if any.
    fn head_commit(&self) -> Option<&str> {
        match self.head.as_ref()? {
            Head::Branch(name) => self.branches.get(name).and_then(|tip| tip.as_deref()),
            Head::Detached(id) => Some(id.as_str()),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) -> Timeline {
        let sid = self.structure_id.clone();
        let mut ops = vec![AnimationOp::message("Restoring git state")];
        for (id, commit) in snapshot.commits {
            if let Some(n) = commit_number(&id) {
                self.ids.bump_to(n + 1);
            }
            ops.push(
                AnimationOp::create_node(&sid, id.as_str())
                    .with("label", commit.message.clone())
                    .with("shape", "circle")
                    .with("kind", "commit"),
            );
            for parent in &commit.parents {
                ops.push(self.edge_op(parent, &id));
            }
            self.commits.insert(id, commit);
        }
        for (name, tip) in snapshot.branches {
            ops.push(self.new_branch_label(&name));
            if let (Some(tip), Some(label)) = (&tip, self.branch_labels.get(&name)) {
                ops.push(move_label(&sid, label, &name, tip));
            }
            self.branches.insert(name, tip);
        }
        ops.push(self.new_head_label());
        self.head = Some(snapshot.head);
        if let (Some(target), Some(label)) = (self.head_commit(), &self.head_label) {
            ops.push(move_label(&sid, label, HEAD_LABEL, target));
        }

        let mut tl = Timeline::new();
        tl.add_step(AnimationStep::labeled("Restore", ops));
        tl.add_step(AnimationStep::labeled("Restore end", vec![AnimationOp::clear_message()]));
        tl
    }

    /// Allocate a label node for branch `name` and return its CREATE_NODE.
    fn new_branch_label(&mut self, name: &str) -> AnimationOp {
        let id = self.ids.alloc_node(&self.structure_id, "label");
        let op = label_op(&self.structure_id, &id, name);
        self.branch_labels.insert(name.to_string(), id);
        op
    }

    fn new_head_label(&mut self) -> AnimationOp {
        let id = self.ids.alloc_node(&self.structure_id, "label");
        let op = label_op(&self.structure_id, &id, HEAD_LABEL);
        self.head_label = Some(id);
        op
    }

    fn edge_op(&self, parent: &str, child: &str) -> AnimationOp {
        let edge = IdAllocator::edge_id(&self.structure_id, EDGE_KIND, parent, child);
        AnimationOp::create_edge(&self.structure_id, edge, parent, child).with("directed", true)
    }
}

/// Validated restore payload; building one never touches the model.
struct Snapshot {
    commits: IndexMap<String, GitCommit>,
    branches: IndexMap<String, Option<String>>,
    head: Head,
}

impl Snapshot {
    fn parse(payload: &Payload) -> Result<Self, ModelError> {
        let op = ModelOp::Init.as_str();
        let mut commits: IndexMap<String, GitCommit> = IndexMap::new();

        let raw_commits = match payload.get("commits") {
            None | Some(JsonValue::Null) => &[][..],
            Some(JsonValue::Array(items)) => items.as_slice(),
            Some(_) => return Err(ModelError::invalid(op, "commits", "commits must be a list")),
        };
        for raw in raw_commits {
            let entry = raw
                .as_object()
                .ok_or_else(|| ModelError::invalid(op, "commits", "commit entries must be mappings"))?;
            let id = args::opt_str(entry, "id", op)?
                .ok_or_else(|| ModelError::missing(op, "commits[].id"))?;
            if commit_number(id).is_none() {
                return Err(ModelError::invalid(op, "commits[].id", format!("'{id}' is not a c<n> id")));
            }
            if commits.contains_key(id) {
                return Err(ModelError::invalid(op, "commits[].id", format!("duplicate commit {id}")));
            }
            let message = args::opt_scalar(entry, "message", op)?
                .map_or_else(|| "commit".to_string(), |m| m.label());
            let parents = match entry.get("parents") {
                None | Some(JsonValue::Null) => Vec::new(),
                Some(JsonValue::Array(items)) => items
                    .iter()
                    .map(|p| {
                        p.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| ModelError::invalid(op, "commits[].parents", "parent ids must be strings"))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Some(_) => {
                    return Err(ModelError::invalid(op, "commits[].parents", "parents must be a list"))
                }
            };
            if let Some(unknown) = parents.iter().find(|p| !commits.contains_key(*p)) {
                return Err(ModelError::invalid(
                    op,
                    "commits[].parents",
                    format!("commit {id} has unknown parent {unknown}"),
                ));
            }
            let branch = args::opt_str(entry, "branch", op)?.map(str::to_string);
            commits.insert(
                id.to_string(),
                GitCommit {
                    message,
                    parents,
                    branch,
                },
            );
        }

        let mut branches: IndexMap<String, Option<String>> = IndexMap::new();
        match payload.get("branches") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Object(map)) => {
                for (name, tip) in map {
                    let tip = match tip {
                        JsonValue::Null => None,
                        JsonValue::String(cid) if commits.contains_key(cid) => Some(cid.clone()),
                        other => {
                            return Err(ModelError::invalid(
                                op,
                                "branches",
                                format!("branch {name} points at unknown commit {other}"),
                            ))
                        }
                    };
                    branches.insert(name.clone(), tip);
                }
            }
            Some(_) => return Err(ModelError::invalid(op, "branches", "branches must be a mapping")),
        }

        let head = match args::opt_str(payload, "head", op)? {
            Some(name) if branches.contains_key(name) => Head::Branch(name.to_string()),
            Some(id) if commits.contains_key(id) => Head::Detached(id.to_string()),
            Some(other) => {
                return Err(ModelError::invalid(op, "head", format!("unknown head {other}")));
            }
            None => match branches.keys().next() {
                Some(first) => Head::Branch(first.clone()),
                None => return Err(ModelError::missing(op, "head")),
            },
        };

        Ok(Self {
            commits,
            branches,
            head,
        })
    }
}

/// `n` of a `c<n>` commit id.
fn commit_number(id: &str) -> Option<u64> {
    id.strip_prefix('c')?.parse().ok()
}

fn label_op(structure_id: &str, id: &str, text: &str) -> AnimationOp {
    AnimationOp::create_node(structure_id, id)
        .with("label", text)
        .with("shape", "rect")
        .with("kind", "label")
}

fn move_label(structure_id: &str, id: &str, text: &str, commit: &str) -> AnimationOp {
    AnimationOp::set_label(structure_id, id, text).with("attach_to", commit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsvis_timeline_core::OpCode;
    use serde_json::json;

    fn repo(sid: &str) -> GitGraphModel {
        let mut m = GitGraphModel::new(sid, IdAllocator::new());
        m.init(&Payload::new()).unwrap();
        m
    }

    fn attach_targets<'a>(tl: &'a Timeline, label: &str) -> Vec<&'a str> {
        tl.ops_of(OpCode::SetLabel)
            .filter(|op| op.target() == Some(label))
            .filter_map(|op| op.str_field("attach_to"))
            .collect()
    }

    #[test]
    fn init_creates_labels_anchored_nowhere() {
        let mut m = GitGraphModel::new("g", IdAllocator::new());
        let tl = m.init(&Payload::new()).unwrap();
        let targets: Vec<&str> = tl.ops_of(OpCode::CreateNode).filter_map(|op| op.target()).collect();
        assert_eq!(targets, vec!["g_label_0", "g_label_1"]);
        assert_eq!(m.branch_label("main"), Some("g_label_0"));
        assert_eq!(m.head_label(), Some("g_label_1"));
        let texts: Vec<&str> = tl.ops_of(OpCode::CreateNode).filter_map(|op| op.str_field("label")).collect();
        assert_eq!(texts, vec!["main", "HEAD"]);
        assert_eq!(tl.count(OpCode::SetLabel), 0);
        assert_eq!(m.node_count(), 0);
    }

    #[test]
    fn commits_chain_and_move_labels() {
        let mut m = repo("g");
        let first = m.commit_on_head("first".into()).unwrap();
        assert_eq!(attach_targets(&first, "g_label_0"), vec!["c2"]);
        assert_eq!(attach_targets(&first, "g_label_1"), vec!["c2"]);
        assert_eq!(first.count(OpCode::CreateEdge), 0);

        let second = m.commit_on_head("second".into()).unwrap();
        let edge = second.ops_of(OpCode::CreateEdge).next().unwrap();
        assert_eq!(edge.target(), Some("g|git|c2->c3"));
        assert_eq!(m.commit("c3").unwrap().parents, vec!["c2".to_string()]);
        assert_eq!(m.branch_tip("main"), Some("c3"));
        assert_eq!(m.node_count(), 2);
    }

    #[test]
    fn commit_message_falls_back_to_value_then_default() {
        let mut m = repo("g");
        let payload = json!({"value": 42}).as_object().cloned().unwrap();
        m.apply_operation(ModelOp::Commit, &payload).unwrap();
        m.apply_operation(ModelOp::Commit, &Payload::new()).unwrap();
        assert_eq!(m.commit("c2").unwrap().message, "42");
        assert_eq!(m.commit("c3").unwrap().message, "commit");
    }

    #[test]
    fn commit_before_init_is_error() {
        let mut m = GitGraphModel::new("g", IdAllocator::new());
        assert!(matches!(
            m.commit_on_head("x".into()),
            Err(ModelError::InvalidState { .. })
        ));
    }

    #[test]
    fn detached_commit_moves_only_head() {
        let mut m = repo("g");
        m.commit_on_head("a".into()).unwrap();
        m.commit_on_head("b".into()).unwrap();
        let tl = m.checkout("c2");
        assert_eq!(attach_targets(&tl, "g_label_1"), vec!["c2"]);
        assert_eq!(m.head(), Some(&Head::Detached("c2".into())));

        let tl = m.commit_on_head("side".into()).unwrap();
        assert_eq!(attach_targets(&tl, "g_label_1"), vec!["c4"]);
        assert!(attach_targets(&tl, "g_label_0").is_empty());
        assert_eq!(m.branch_tip("main"), Some("c3"));
        assert_eq!(m.commit("c4").unwrap().parents, vec!["c2".to_string()]);
        assert_eq!(m.commit("c4").unwrap().branch, None);
    }

    #[test]
    fn checkout_unknown_target_is_message() {
        let mut m = repo("g");
        let tl = m.checkout("nope");
        assert!(tl
            .ops_of(OpCode::SetMessage)
            .any(|op| op.str_field("text") == Some("Target not found")));
        assert_eq!(m.head(), Some(&Head::Branch("main".into())));
    }

    #[test]
    fn branch_creates_label_at_head_commit() {
        let mut m = repo("g");
        assert!(m.branch("dev").is_err());
        m.commit_on_head("a".into()).unwrap();
        let tl = m.branch("dev").unwrap();
        assert_eq!(m.branch_label("dev"), Some("g_label_3"));
        let created = tl.ops_of(OpCode::CreateNode).next().unwrap();
        assert_eq!(created.target(), Some("g_label_3"));
        assert_eq!(created.str_field("label"), Some("dev"));
        assert_eq!(attach_targets(&tl, "g_label_3"), vec!["c2"]);

        let again = m.branch("dev").unwrap();
        assert_eq!(again.count(OpCode::CreateNode), 0);

        m.checkout("dev");
        m.commit_on_head("on dev".into()).unwrap();
        assert_eq!(m.branch_tip("dev"), Some("c4"));
        assert_eq!(m.branch_tip("main"), Some("c2"));
    }

    #[test]
    fn export_restore_round_trip() {
        let mut m = repo("g");
        m.commit_on_head("a".into()).unwrap();
        m.commit_on_head("b".into()).unwrap();
        let state = m.export_state();
        assert_eq!(state["head"], json!("main"));
        assert_eq!(state["branches"], json!({"main": "c3"}));

        let mut restored = GitGraphModel::new("g2", IdAllocator::new());
        let tl = restored.init(&state).unwrap();
        assert_eq!(restored.node_count(), 2);
        assert_eq!(restored.head(), Some(&Head::Branch("main".into())));
        assert_eq!(restored.branch_label("main"), Some("g2_label_4"));
        assert_eq!(restored.head_label(), Some("g2_label_5"));
        assert_eq!(attach_targets(&tl, "g2_label_5"), vec!["c3"]);
        restored.commit_on_head("c".into()).unwrap();
        assert!(restored.commit("c6").is_some());
    }

    #[test]
    fn restore_rejects_unknown_parent_without_mutation() {
        let mut m = repo("g");
        m.commit_on_head("a".into()).unwrap();
        let bad = json!({
            "commits": [{"id": "c5", "message": "x", "parents": ["c9"]}],
            "branches": {"main": "c5"},
            "head": "main"
        });
        assert!(m.init(bad.as_object().unwrap()).is_err());
        assert_eq!(m.node_count(), 1);
        assert_eq!(m.branch_tip("main"), Some("c2"));
        assert_eq!(m.head_label(), Some("g_label_1"));
    }

    #[test]
    fn delete_all_removes_labels_and_commits() {
        let mut m = repo("g");
        m.commit_on_head("a".into()).unwrap();
        m.commit_on_head("b".into()).unwrap();
        let tl = m.delete_all();
        let deleted: Vec<&str> = tl.ops_of(OpCode::DeleteNode).filter_map(|op| op.target()).collect();
        assert_eq!(deleted, vec!["g_label_1", "g_label_0", "c2", "c3"]);
        assert_eq!(tl.count(OpCode::DeleteEdge), 1);
        assert_eq!(m.head_label(), None);
        assert!(m.delete_all().is_empty());
    }

    #[test]
    fn reinit_never_reuses_label_ids() {
        let mut m = repo("g");
        m.commit_on_head("a".into()).unwrap();
        let tl = m.init(&Payload::new()).unwrap();
        let created: Vec<&str> = tl.ops_of(OpCode::CreateNode).filter_map(|op| op.target()).collect();
        assert_eq!(created, vec!["g_label_3", "g_label_4"]);
        m.commit_on_head("b".into()).unwrap();
        assert!(m.commit("c5").is_some());
    }
}
