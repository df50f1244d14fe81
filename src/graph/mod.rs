//! Prerequisite knowledge graph with forward risk propagation.
//!
//! Courses are nodes; a directed edge `prereq -> course` carries a
//! strength in (0, 1] describing how much failing the prerequisite
//! transfers to the dependent course. The graph answers structural
//! queries (prerequisites, dependents, depth, learning path) and
//! propagates failure risk forward with per-hop decay.
//!
//! Topology is data, not code: graphs are built from a
//! [`CurriculumSpec`], and the default curriculum ships as a fixture
//! via [`default_curriculum`]. Unknown course names are fail-soft:
//! queries return empty results rather than erroring.

use crate::error::{PreverError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Per-hop forward decay applied on top of edge strength.
const DECAY: f32 = 0.8;

/// Propagation stops expanding below this accumulated risk.
const PRUNE_THRESHOLD: f32 = 0.2;

/// Difficulty assigned to courses without an explicit rating.
const DEFAULT_DIFFICULTY: f32 = 0.75;

/// Course-to-propagated-risk map produced by [`KnowledgeGraph::propagate`].
pub type PropagatedRisk = HashMap<String, f32>;

/// One prerequisite edge in a curriculum description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Course that must come first
    pub prerequisite: String,
    /// Course that depends on it
    pub course: String,
    /// Transfer strength in (0, 1]
    pub strength: f32,
}

/// Declarative curriculum: dependency edges plus optional per-course
/// difficulty overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumSpec {
    /// Prerequisite edges
    pub dependencies: Vec<DependencySpec>,
    /// Difficulty overrides by course name; absent courses get 0.75
    #[serde(default)]
    pub difficulties: HashMap<String, f32>,
}

/// A neighboring course with the strength of the connecting edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDependency {
    /// Neighbor course name
    pub subject: String,
    /// Strength of the edge to/from the queried course
    pub dependency_strength: f32,
}

/// A prerequisite ranked by leverage over a set of current courses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPrerequisite {
    /// Prerequisite course name
    pub subject: String,
    /// Which of the queried courses depend on it
    pub dependent_courses: Vec<String>,
    /// Average edge strength toward those courses
    pub avg_strength: f32,
    /// `dependent_courses.len() as f32 * avg_strength`
    pub criticality: f32,
}

/// Structural dump for external visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    /// All courses with their difficulty
    pub nodes: Vec<NodeExport>,
    /// All prerequisite edges
    pub edges: Vec<EdgeExport>,
}

/// One exported course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExport {
    pub id: String,
    pub difficulty: f32,
}

/// One exported edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeExport {
    pub source: String,
    pub target: String,
    pub strength: f32,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    difficulty: f32,
}

/// Directed prerequisite graph over course names.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    ids: HashMap<String, usize>,
    nodes: Vec<Node>,
    outgoing: Vec<Vec<(usize, f32)>>,
    incoming: Vec<Vec<(usize, f32)>>,
}

/// The built-in curriculum fixture: mathematics, programming, physics
/// and engineering tracks. Stands in for institutional data.
#[must_use]
pub fn default_curriculum() -> CurriculumSpec {
    let edges = [
        ("Calculus I", "Calculus II", 0.9),
        ("Calculus II", "Calculus III", 0.85),
        ("Calculus I", "Linear Algebra", 0.7),
        ("Linear Algebra", "Differential Equations", 0.8),
        ("Programming Fundamentals", "Data Structures", 0.95),
        ("Data Structures", "Algorithms", 0.90),
        ("Programming Fundamentals", "Object Oriented Programming", 0.85),
        ("Data Structures", "Database Systems", 0.70),
        ("Physics I", "Physics II", 0.85),
        ("Calculus I", "Physics I", 0.75),
        ("Physics II", "Quantum Mechanics", 0.80),
        ("Calculus I", "Probability and Statistics", 0.70),
        ("Programming Fundamentals", "Machine Learning", 0.80),
        ("Linear Algebra", "Machine Learning", 0.85),
        ("Algorithms", "Advanced Algorithms", 0.90),
        ("Chemistry", "Organic Chemistry", 0.85),
        ("Physics I", "Thermodynamics", 0.75),
        ("Calculus II", "Engineering Mathematics", 0.80),
    ];
    CurriculumSpec {
        dependencies: edges
            .iter()
            .map(|&(prerequisite, course, strength)| DependencySpec {
                prerequisite: prerequisite.to_string(),
                course: course.to_string(),
                strength,
            })
            .collect(),
        difficulties: HashMap::new(),
    }
}

impl KnowledgeGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph carrying the default curriculum fixture.
    #[must_use]
    pub fn with_default_curriculum() -> Self {
        let mut graph = Self::new();
        for edge in default_curriculum().dependencies {
            graph.add_dependency(&edge.prerequisite, &edge.course, edge.strength);
        }
        graph
    }

    /// Builds a graph from a curriculum description.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::ValidationError`] for any edge strength
    /// outside (0, 1] or a self-dependency.
    pub fn from_spec(spec: &CurriculumSpec) -> Result<Self> {
        let mut graph = Self::new();
        for edge in &spec.dependencies {
            if !(edge.strength > 0.0 && edge.strength <= 1.0) {
                return Err(PreverError::ValidationError {
                    message: format!(
                        "dependency '{}' -> '{}' has strength {} outside (0, 1]",
                        edge.prerequisite, edge.course, edge.strength
                    ),
                });
            }
            if edge.prerequisite == edge.course {
                return Err(PreverError::ValidationError {
                    message: format!("course '{}' cannot depend on itself", edge.course),
                });
            }
            graph.add_dependency(&edge.prerequisite, &edge.course, edge.strength);
        }
        for (course, &difficulty) in &spec.difficulties {
            let idx = graph.intern(course);
            graph.nodes[idx].difficulty = difficulty;
        }
        Ok(graph)
    }

    /// Builds a graph from a JSON curriculum description.
    ///
    /// # Errors
    ///
    /// Returns a serialization error on malformed JSON, or a validation
    /// error for out-of-range strengths.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: CurriculumSpec =
            serde_json::from_str(json).map_err(|e| PreverError::Serialization(e.to_string()))?;
        Self::from_spec(&spec)
    }

    /// Adds or updates a prerequisite edge, creating nodes as needed.
    pub fn add_dependency(&mut self, prerequisite: &str, course: &str, strength: f32) {
        let src = self.intern(prerequisite);
        let dst = self.intern(course);

        match self.outgoing[src].iter_mut().find(|(to, _)| *to == dst) {
            Some(edge) => edge.1 = strength,
            None => self.outgoing[src].push((dst, strength)),
        }
        match self.incoming[dst].iter_mut().find(|(from, _)| *from == src) {
            Some(edge) => edge.1 = strength,
            None => self.incoming[dst].push((src, strength)),
        }
    }

    /// Number of courses.
    #[must_use]
    pub fn n_courses(&self) -> usize {
        self.nodes.len()
    }

    /// True if the course exists in the graph.
    #[must_use]
    pub fn contains(&self, course: &str) -> bool {
        self.ids.contains_key(course)
    }

    /// Direct prerequisites of a course, strongest first. Empty for
    /// unknown or isolated courses.
    #[must_use]
    pub fn prerequisites(&self, course: &str) -> Vec<CourseDependency> {
        self.neighbors(course, &self.incoming)
    }

    /// Direct dependents of a course, strongest first. Empty for
    /// unknown or isolated courses.
    #[must_use]
    pub fn dependents(&self, course: &str) -> Vec<CourseDependency> {
        self.neighbors(course, &self.outgoing)
    }

    /// Length of the longest prerequisite chain ending at `course`.
    /// 0 for unknown courses or courses with no ancestors.
    #[must_use]
    pub fn dependency_depth(&self, course: &str) -> usize {
        let Some(&idx) = self.ids.get(course) else {
            return 0;
        };
        let mut memo = vec![None; self.nodes.len()];
        let mut in_progress = vec![false; self.nodes.len()];
        self.depth_of(idx, &mut memo, &mut in_progress)
    }

    /// Propagates failure risk forward from `source_course`.
    ///
    /// Breadth-first: each hop multiplies by edge strength and the
    /// fixed decay 0.8; multiple inbound paths combine by maximum.
    /// Expansion stops below the 0.2 pruning threshold, and the visited
    /// set guarantees termination on cyclic input. The source course is
    /// never a key of the result.
    #[must_use]
    pub fn propagate(&self, source_course: &str, source_risk: f32) -> PropagatedRisk {
        let Some(&source) = self.ids.get(source_course) else {
            return PropagatedRisk::new();
        };

        let mut risks: HashMap<usize, f32> = HashMap::new();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut queue: VecDeque<(usize, f32)> = VecDeque::new();
        queue.push_back((source, source_risk));

        while let Some((current, risk)) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for &(dependent, strength) in &self.outgoing[current] {
                let propagated = risk * strength * DECAY;
                let entry = risks.entry(dependent).or_insert(propagated);
                *entry = (*entry).max(propagated);
                if propagated > PRUNE_THRESHOLD {
                    queue.push_back((dependent, propagated));
                }
            }
        }

        risks.remove(&source);
        risks
            .into_iter()
            .map(|(idx, risk)| (self.nodes[idx].name.clone(), risk))
            .collect()
    }

    /// Prerequisites of the given courses ranked by leverage.
    ///
    /// Criticality of a prerequisite is the number of the given courses
    /// it feeds into times its average edge strength toward exactly
    /// those courses.
    #[must_use]
    pub fn critical_prerequisites(&self, current_courses: &[&str]) -> Vec<CriticalPrerequisite> {
        let mut order: Vec<String> = Vec::new();
        let mut by_prereq: HashMap<String, (Vec<String>, Vec<f32>)> = HashMap::new();

        for &course in current_courses {
            for prereq in self.prerequisites(course) {
                let entry = by_prereq.entry(prereq.subject.clone()).or_insert_with(|| {
                    order.push(prereq.subject.clone());
                    (Vec::new(), Vec::new())
                });
                entry.0.push(course.to_string());
                entry.1.push(prereq.dependency_strength);
            }
        }

        let mut ranked: Vec<CriticalPrerequisite> = order
            .into_iter()
            .filter_map(|subject| {
                let (dependent_courses, strengths) = by_prereq.remove(&subject)?;
                let avg_strength = strengths.iter().sum::<f32>() / strengths.len() as f32;
                Some(CriticalPrerequisite {
                    criticality: dependent_courses.len() as f32 * avg_strength,
                    subject,
                    dependent_courses,
                    avg_strength,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.criticality
                .partial_cmp(&a.criticality)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Topological learning order over all ancestors of `target_course`
    /// plus the target itself.
    ///
    /// Falls back to `[target_course]` when the course is unknown or
    /// the ancestor subgraph contains a cycle.
    #[must_use]
    pub fn learning_path(&self, target_course: &str) -> Vec<String> {
        let fallback = || vec![target_course.to_string()];
        let Some(&target) = self.ids.get(target_course) else {
            return fallback();
        };

        // Ancestor set by reverse BFS.
        let mut members: HashSet<usize> = HashSet::new();
        let mut queue: VecDeque<usize> = VecDeque::new();
        members.insert(target);
        queue.push_back(target);
        while let Some(current) = queue.pop_front() {
            for &(prereq, _) in &self.incoming[current] {
                if members.insert(prereq) {
                    queue.push_back(prereq);
                }
            }
        }

        // Kahn's algorithm over the induced subgraph.
        let mut indegree: HashMap<usize, usize> = members.iter().map(|&m| (m, 0)).collect();
        for &member in &members {
            for &(dependent, _) in &self.outgoing[member] {
                if let Some(count) = indegree.get_mut(&dependent) {
                    *count += 1;
                }
            }
        }

        let mut ready: Vec<usize> = indegree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&idx, _)| idx)
            .collect();
        ready.sort_by(|&a, &b| self.nodes[a].name.cmp(&self.nodes[b].name));

        let mut path = Vec::with_capacity(members.len());
        while let Some(next) = ready.pop() {
            path.push(next);
            for &(dependent, _) in &self.outgoing[next] {
                if let Some(count) = indegree.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(dependent);
                        ready.sort_by(|&a, &b| self.nodes[a].name.cmp(&self.nodes[b].name));
                    }
                }
            }
        }

        if path.len() != members.len() {
            return fallback();
        }
        path.into_iter()
            .map(|idx| self.nodes[idx].name.clone())
            .collect()
    }

    /// Structural dump of the current graph state.
    #[must_use]
    pub fn export(&self) -> GraphExport {
        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeExport {
                id: node.name.clone(),
                difficulty: node.difficulty,
            })
            .collect();
        let edges = self
            .nodes
            .iter()
            .enumerate()
            .flat_map(|(src, node)| {
                self.outgoing[src].iter().map(move |&(dst, strength)| {
                    (node.name.clone(), dst, strength)
                })
            })
            .map(|(source, dst, strength)| EdgeExport {
                source,
                target: self.nodes[dst].name.clone(),
                strength,
            })
            .collect();
        GraphExport { nodes, edges }
    }

    fn intern(&mut self, course: &str) -> usize {
        if let Some(&idx) = self.ids.get(course) {
            return idx;
        }
        let idx = self.nodes.len();
        self.ids.insert(course.to_string(), idx);
        self.nodes.push(Node {
            name: course.to_string(),
            difficulty: DEFAULT_DIFFICULTY,
        });
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        idx
    }

    fn neighbors(&self, course: &str, adjacency: &[Vec<(usize, f32)>]) -> Vec<CourseDependency> {
        let Some(&idx) = self.ids.get(course) else {
            return Vec::new();
        };
        let mut result: Vec<CourseDependency> = adjacency[idx]
            .iter()
            .map(|&(neighbor, strength)| CourseDependency {
                subject: self.nodes[neighbor].name.clone(),
                dependency_strength: strength,
            })
            .collect();
        result.sort_by(|a, b| {
            b.dependency_strength
                .partial_cmp(&a.dependency_strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        result
    }

    fn depth_of(
        &self,
        idx: usize,
        memo: &mut Vec<Option<usize>>,
        in_progress: &mut Vec<bool>,
    ) -> usize {
        if let Some(depth) = memo[idx] {
            return depth;
        }
        if in_progress[idx] {
            // Cycle: treat the back-edge as depth 0.
            return 0;
        }
        in_progress[idx] = true;
        let depth = self.incoming[idx]
            .iter()
            .map(|&(prereq, _)| 1 + self.depth_of(prereq, memo, in_progress))
            .max()
            .unwrap_or(0);
        in_progress[idx] = false;
        memo[idx] = Some(depth);
        depth
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
