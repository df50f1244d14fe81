use super::*;

fn chain_graph() -> KnowledgeGraph {
    // A -> B -> C with strong edges, plus a weak side branch.
    let mut graph = KnowledgeGraph::new();
    graph.add_dependency("A", "B", 0.9);
    graph.add_dependency("B", "C", 0.8);
    graph.add_dependency("A", "D", 0.3);
    graph
}

#[test]
fn test_empty_graph_is_fail_soft() {
    let graph = KnowledgeGraph::new();
    assert!(graph.prerequisites("Anything").is_empty());
    assert!(graph.dependents("Anything").is_empty());
    assert_eq!(graph.dependency_depth("Anything"), 0);
    assert!(graph.propagate("Anything", 1.0).is_empty());
    assert_eq!(graph.learning_path("Anything"), vec!["Anything"]);
}

#[test]
fn test_default_curriculum_topology() {
    let graph = KnowledgeGraph::with_default_curriculum();
    assert!(graph.contains("Calculus I"));
    assert!(graph.contains("Machine Learning"));

    let prereqs = graph.prerequisites("Machine Learning");
    assert_eq!(prereqs.len(), 2);
    assert_eq!(prereqs[0].subject, "Linear Algebra");
    assert!((prereqs[0].dependency_strength - 0.85).abs() < 1e-6);
    assert_eq!(prereqs[1].subject, "Programming Fundamentals");

    let dependents = graph.dependents("Calculus I");
    assert_eq!(dependents.len(), 4);
    assert_eq!(dependents[0].subject, "Calculus II");
}

#[test]
fn test_dependency_depth_counts_longest_chain() {
    let graph = KnowledgeGraph::with_default_curriculum();
    assert_eq!(graph.dependency_depth("Calculus I"), 0);
    assert_eq!(graph.dependency_depth("Calculus II"), 1);
    assert_eq!(graph.dependency_depth("Calculus III"), 2);
    // Machine Learning: Calculus I -> Linear Algebra -> Machine Learning.
    assert_eq!(graph.dependency_depth("Machine Learning"), 2);
    // Advanced Algorithms: Fundamentals -> Data Structures -> Algorithms -> here.
    assert_eq!(graph.dependency_depth("Advanced Algorithms"), 3);
}

#[test]
fn test_add_dependency_updates_existing_edge() {
    let mut graph = chain_graph();
    graph.add_dependency("A", "B", 0.5);

    let dependents = graph.dependents("A");
    let edge = dependents.iter().find(|d| d.subject == "B").expect("edge");
    assert!((edge.dependency_strength - 0.5).abs() < 1e-6);
    assert_eq!(graph.n_courses(), 4, "no duplicate nodes");
}

#[test]
fn test_propagate_two_hop_chain() {
    let graph = chain_graph();
    let risks = graph.propagate("A", 1.0);

    // B = 1.0 * 0.9 * 0.8; C = 0.72 * 0.8 * 0.8.
    assert!((risks["B"] - 0.72).abs() < 1e-5);
    assert!((risks["C"] - 0.4608).abs() < 1e-5);
    assert!(!risks.contains_key("A"), "source never appears");
    // D gets a value but 0.24 * ... its own expansion is moot (leaf).
    assert!((risks["D"] - 0.24).abs() < 1e-5);
}

#[test]
fn test_propagate_prunes_weak_branches() {
    let mut graph = KnowledgeGraph::new();
    graph.add_dependency("A", "B", 0.2);
    graph.add_dependency("B", "C", 0.9);
    let risks = graph.propagate("A", 1.0);

    // B = 0.16 <= 0.2, so expansion stops before C.
    assert!((risks["B"] - 0.16).abs() < 1e-5);
    assert!(!risks.contains_key("C"));
}

#[test]
fn test_propagate_decay_bound() {
    let graph = KnowledgeGraph::with_default_curriculum();
    let source_risk = 0.9;
    for (_, risk) in graph.propagate("Calculus I", source_risk) {
        assert!(risk <= source_risk * 0.8 + 1e-6);
        assert!(risk > 0.0);
    }
}

#[test]
fn test_propagate_max_combines_multiple_paths() {
    // Diamond: A feeds C directly (weak) and through B (strong).
    let mut graph = KnowledgeGraph::new();
    graph.add_dependency("A", "B", 0.9);
    graph.add_dependency("B", "C", 0.9);
    graph.add_dependency("A", "C", 0.4);
    let risks = graph.propagate("A", 1.0);

    // Via B: 0.72 * 0.9 * 0.8 = 0.5184; direct: 0.32. Max wins.
    assert!((risks["C"] - 0.5184).abs() < 1e-4);
}

#[test]
fn test_propagate_terminates_on_cycle() {
    let mut graph = KnowledgeGraph::new();
    graph.add_dependency("A", "B", 0.9);
    graph.add_dependency("B", "A", 0.9);
    let risks = graph.propagate("A", 1.0);

    assert!(risks.contains_key("B"));
    assert!(!risks.contains_key("A"));
}

#[test]
fn test_critical_prerequisites_shared_prereq_ranks_first() {
    let mut graph = KnowledgeGraph::new();
    graph.add_dependency("P", "X", 0.8);
    graph.add_dependency("P", "Y", 0.6);
    graph.add_dependency("Q", "X", 0.95);

    let ranked = graph.critical_prerequisites(&["X", "Y"]);
    assert_eq!(ranked[0].subject, "P");
    assert!((ranked[0].avg_strength - 0.7).abs() < 1e-6);
    assert!((ranked[0].criticality - 1.4).abs() < 1e-6);
    assert_eq!(ranked[0].dependent_courses, vec!["X", "Y"]);

    let q = ranked.iter().find(|r| r.subject == "Q").expect("Q ranked");
    assert!((q.criticality - 0.95).abs() < 1e-6);
    assert!(ranked[0].criticality > q.criticality);
}

#[test]
fn test_critical_prerequisites_unknown_courses_empty() {
    let graph = KnowledgeGraph::with_default_curriculum();
    assert!(graph.critical_prerequisites(&["Underwater Basket Weaving"]).is_empty());
    assert!(graph.critical_prerequisites(&[]).is_empty());
}

#[test]
fn test_learning_path_is_topological() {
    let graph = KnowledgeGraph::with_default_curriculum();
    let path = graph.learning_path("Machine Learning");

    let position = |name: &str| {
        path.iter()
            .position(|course| course == name)
            .unwrap_or_else(|| panic!("{name} missing from path"))
    };
    assert_eq!(path.len(), 4);
    assert!(position("Calculus I") < position("Linear Algebra"));
    assert!(position("Linear Algebra") < position("Machine Learning"));
    assert!(position("Programming Fundamentals") < position("Machine Learning"));
    assert_eq!(*path.last().expect("non-empty"), "Machine Learning");
}

#[test]
fn test_learning_path_cycle_falls_back_to_target() {
    let mut graph = KnowledgeGraph::new();
    graph.add_dependency("A", "B", 0.9);
    graph.add_dependency("B", "A", 0.9);
    assert_eq!(graph.learning_path("B"), vec!["B"]);
}

#[test]
fn test_from_spec_validates_strength() {
    let spec = CurriculumSpec {
        dependencies: vec![DependencySpec {
            prerequisite: "A".to_string(),
            course: "B".to_string(),
            strength: 1.5,
        }],
        difficulties: HashMap::new(),
    };
    assert!(matches!(
        KnowledgeGraph::from_spec(&spec).unwrap_err(),
        PreverError::ValidationError { .. }
    ));

    let zero = CurriculumSpec {
        dependencies: vec![DependencySpec {
            prerequisite: "A".to_string(),
            course: "B".to_string(),
            strength: 0.0,
        }],
        difficulties: HashMap::new(),
    };
    assert!(KnowledgeGraph::from_spec(&zero).is_err());
}

#[test]
fn test_from_spec_rejects_self_dependency() {
    let spec = CurriculumSpec {
        dependencies: vec![DependencySpec {
            prerequisite: "A".to_string(),
            course: "A".to_string(),
            strength: 0.5,
        }],
        difficulties: HashMap::new(),
    };
    assert!(KnowledgeGraph::from_spec(&spec).is_err());
}

#[test]
fn test_from_json_roundtrip() {
    let json = r#"{
        "dependencies": [
            {"prerequisite": "A", "course": "B", "strength": 0.9}
        ],
        "difficulties": {"A": 0.95}
    }"#;
    let graph = KnowledgeGraph::from_json(json).expect("valid json");
    assert!(graph.contains("A"));
    assert_eq!(graph.dependents("A")[0].subject, "B");

    let export = graph.export();
    let a = export.nodes.iter().find(|n| n.id == "A").expect("node A");
    assert!((a.difficulty - 0.95).abs() < 1e-6);

    assert!(KnowledgeGraph::from_json("not json").is_err());
}

#[test]
fn test_export_reflects_graph_state() {
    let graph = chain_graph();
    let export = graph.export();

    assert_eq!(export.nodes.len(), 4);
    assert_eq!(export.edges.len(), 3);
    for node in &export.nodes {
        assert!((node.difficulty - 0.75).abs() < 1e-6);
    }
    let edge = export
        .edges
        .iter()
        .find(|e| e.source == "A" && e.target == "B")
        .expect("A->B edge");
    assert!((edge.strength - 0.9).abs() < 1e-6);

    let json = serde_json::to_string(&export).expect("serialize");
    assert!(json.contains("\"strength\""));
}
