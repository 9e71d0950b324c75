mod util;
use std::collections::HashSet;

use util::*;
use wake_mesh::prelude::*;
use wake_mesh::topology::validation::{MeshValidationOptions, validate_mesh};

fn chains(surface: &Surface) -> Vec<Vec<usize>> {
    (0..surface.sheets().len())
        .map(|s| surface.sheet_nodes(s).map(|k| k.node.index()).collect())
        .collect()
}

#[test]
fn coincident_wingtips_of_separate_components_do_not_join() {
    let surface = SurfaceBuilder::default()
        .build(&wedge_pair())
        .expect("wedges should build");
    assert_eq!(surface.kind(), SurfaceKind::Triangulated);
    assert_eq!(surface.nodes().len(), 18);
    assert_eq!(surface.triangles().len(), 28);
    validate_mesh(surface.grid(), MeshValidationOptions::all()).unwrap();

    // trailing-edge nodes are every third node
    assert_eq!(chains(&surface), vec![vec![2, 5, 8], vec![11, 14, 17]]);
    let components: Vec<ComponentId> = surface.sheets().iter().map(|s| s.component).collect();
    assert_eq!(components, vec![ComponentId(1), ComponentId(2)]);
    for sheet in surface.sheets() {
        assert!(!sheet.periodic);
        for &k in &sheet.kutta_nodes {
            let kutta = &surface.kutta_nodes()[k];
            assert_eq!(kutta.component, sheet.component);
            assert_eq!(surface.nodes()[kutta.node.index()].component, sheet.component);
        }
    }
}

#[test]
fn tip_faces_mark_chain_ends_as_wingtips() {
    let surface = SurfaceBuilder::default().build(&wedge_pair()).unwrap();
    for s in 0..surface.sheets().len() {
        let chain: Vec<&KuttaNode> = surface.sheet_nodes(s).collect();
        assert_eq!(chain.len(), 3);
        assert!(chain[0].is_wingtip);
        assert!(!chain[1].is_wingtip);
        assert!(chain[2].is_wingtip);
        let fractions: Vec<f64> = chain.iter().map(|k| k.arc_fraction).collect();
        assert_eq!(fractions, vec![0.0, 0.5, 1.0]);
        let tip = &surface.nodes()[chain[0].node.index()];
        assert!(tip.flags.contains(NodeFlags::WINGTIP | NodeFlags::KUTTA));
    }
}

#[test]
fn key_file_names_the_patches() {
    let surface = SurfaceBuilder::default().build(&wedge_pair()).unwrap();
    let names: Vec<&str> = surface.patches().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["LeftWing", "RightWing"]);
    assert_eq!(surface.patches()[1].component, ComponentId(2));
    assert_eq!(surface.patches()[1].id, PatchId(2));
}

#[test]
fn leading_edges_and_caps_become_boundaries() {
    let surface = SurfaceBuilder::default().build(&wedge_pair()).unwrap();
    let trailing: HashSet<usize> = surface
        .edges()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.flags.contains(EdgeFlags::TRAILING_EDGE))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(trailing.len(), 4);
    for edge in surface.edges() {
        let [p, q] = edge.nodes.map(|n| surface.nodes()[n.index()].position);
        let leading_line = p[0] == 0.0 && q[0] == 0.0 && p[2] == q[2];
        if leading_line {
            // upper and lower leading-edge lines meet the front face at 90 degrees or more
            assert!(edge.flags.contains(EdgeFlags::BOUNDARY), "{edge:?}");
        }
    }
}

#[test]
fn explicit_sharp_nodes_give_the_same_chains() {
    let GeometrySource::RawTriangulation { text, key, .. } = wedge_pair() else {
        unreachable!()
    };
    let source = GeometrySource::RawTriangulation {
        text,
        key,
        sharp_nodes: Some(vec![3, 6, 9, 12, 15, 18]),
    };
    let surface = SurfaceBuilder::default().build(&source).unwrap();
    assert_eq!(chains(&surface), vec![vec![2, 5, 8], vec![11, 14, 17]]);
}

#[test]
fn key_listing_too_few_surfaces_is_a_mismatch() {
    let GeometrySource::RawTriangulation { text, .. } = wedge_pair() else {
        unreachable!()
    };
    let source = GeometrySource::RawTriangulation {
        text,
        key: Some("1\n11,0,0,LeftWing\n".into()),
        sharp_nodes: None,
    };
    let err = SurfaceBuilder::default().build(&source).unwrap_err();
    assert!(matches!(
        err,
        WakeMeshError::UnknownSurfaceId(12) | WakeMeshError::CountMismatch { .. }
    ));
}
