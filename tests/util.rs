#![allow(dead_code)]
use std::fmt::Write;

use wake_mesh::io::GeometrySource;

/// Planform of a generated flat-plate wing.
#[derive(Clone, Copy, Debug)]
pub struct Planform {
    pub span: f64,
    pub chord: f64,
    /// x offset of the leading edge per unit span.
    pub sweep: f64,
    /// z rise per unit span.
    pub dihedral: f64,
}

impl Default for Planform {
    fn default() -> Self {
        Planform {
            span: 4.0,
            chord: 1.0,
            sweep: 0.0,
            dihedral: 0.0,
        }
    }
}

/// Flat-plate wing text with `ni` evenly spaced spanwise stations and `nj`
/// chordwise points, trailing edge first.
pub fn wing_text(ni: usize, nj: usize, planform: Planform) -> String {
    let stations: Vec<f64> = (0..ni)
        .map(|i| planform.span * i as f64 / (ni - 1) as f64)
        .collect();
    wing_text_at(&stations, nj, planform)
}

/// Flat-plate wing text with one station per listed span position.
pub fn wing_text_at(stations: &[f64], nj: usize, planform: Planform) -> String {
    let ni = stations.len();
    let point = |i: usize, j: usize| {
        let y = stations[i];
        let x = planform.sweep * y + planform.chord * (1.0 - j as f64 / (nj - 1) as f64);
        [x, y, planform.dihedral * y]
    };
    let len = (1.0 + planform.dihedral * planform.dihedral).sqrt();
    let normal = [0.0, -planform.dihedral / len, 1.0 / len];

    let mut s = String::from("# generated wing\n");
    writeln!(s, "SURFACE_NODE,{ni},{nj}").unwrap();
    s.push_str("x,y,z,u,v\n");
    for i in 0..ni {
        for j in 0..nj {
            let [x, y, z] = point(i, j);
            writeln!(s, "{x},{y},{z},{i},{j}").unwrap();
        }
    }
    writeln!(s, "PLATE,{ni},{nj}").unwrap();
    s.push_str("nx,ny,nz\n");
    for _ in 0..ni {
        writeln!(s, "{},{},{}", normal[0], normal[1], normal[2]).unwrap();
    }
    s.push_str("x,y,z,camber,xxx,Nx,Ny,Nz,u,xxx,v\n");
    for i in 0..ni {
        for j in 0..nj {
            let [x, y, z] = point(i, j);
            let (u, v) = (i as f64 / (ni - 1) as f64, j as f64 / (nj - 1) as f64);
            writeln!(
                s,
                "{x},{y},{z},0,0,{},{},{},{u},0,{v}",
                normal[0], normal[1], normal[2]
            )
            .unwrap();
        }
    }
    s
}

pub fn wing(name: &str, ni: usize, nj: usize, planform: Planform) -> GeometrySource {
    GeometrySource::FlatPlateWing {
        name: name.into(),
        text: wing_text(ni, nj, planform),
    }
}

/// Closed body of revolution along x: `ni` axial stations of `nj` ring
/// points, the first and last station shrunk to a point. The ring's last
/// point repeats its first.
pub fn body_text(ni: usize, nj: usize) -> String {
    let mut s = String::from("# generated body\n");
    writeln!(s, "SURFACE_NODE,{ni},{nj}").unwrap();
    s.push_str("x,y,z,u,v\n");
    for i in 0..ni {
        let t = i as f64 / (ni - 1) as f64;
        let radius = if i == 0 || i == ni - 1 {
            0.0
        } else {
            (std::f64::consts::PI * t).sin()
        };
        for j in 0..nj {
            let angle = 2.0 * std::f64::consts::PI * j as f64 / (nj - 1) as f64;
            let (y, z) = (radius * angle.cos(), radius * angle.sin());
            writeln!(s, "{},{y},{z},{t},{}", 10.0 * t, j as f64 / (nj - 1) as f64).unwrap();
        }
    }
    s
}

pub fn body(name: &str, ni: usize, nj: usize) -> GeometrySource {
    GeometrySource::FlatPlateBody {
        name: name.into(),
        text: body_text(ni, nj),
    }
}

/// Half thickness of the wedge sections.
pub const WEDGE_T: f64 = 0.1;

/// Nodes and outward-wound triangles of a closed wedge wing spanning
/// `y0..y0 + span` in `segments` pieces. Section nodes per station are the
/// upper leading edge, the lower leading edge and the trailing edge.
pub fn wedge(y0: f64, span: f64, segments: usize) -> (Vec<[f64; 3]>, Vec<[usize; 3]>) {
    let mut nodes = Vec::new();
    for s in 0..=segments {
        let y = y0 + span * s as f64 / segments as f64;
        nodes.push([0.0, y, WEDGE_T]);
        nodes.push([0.0, y, -WEDGE_T]);
        nodes.push([1.0, y, 0.0]);
    }
    let (a, b, c) = (|s: usize| 3 * s, |s: usize| 3 * s + 1, |s: usize| 3 * s + 2);
    let mut tris = Vec::new();
    for s in 0..segments {
        let n = s + 1;
        tris.push([a(s), c(s), c(n)]);
        tris.push([a(s), c(n), a(n)]);
        tris.push([b(s), c(n), c(s)]);
        tris.push([b(s), b(n), c(n)]);
        tris.push([a(s), b(n), b(s)]);
        tris.push([a(s), a(n), b(n)]);
    }
    tris.push([a(0), b(0), c(0)]);
    tris.push([a(segments), c(segments), b(segments)]);
    (nodes, tris)
}

/// Raw triangulation text from parts, each part tagged with its surface id.
pub fn tri_text(parts: &[(i64, Vec<[f64; 3]>, Vec<[usize; 3]>)]) -> String {
    let node_count: usize = parts.iter().map(|p| p.1.len()).sum();
    let tri_count: usize = parts.iter().map(|p| p.2.len()).sum();
    let mut s = format!("{node_count} {tri_count}\n");
    for (_, nodes, _) in parts {
        for [x, y, z] in nodes {
            writeln!(s, "{x} {y} {z}").unwrap();
        }
    }
    let mut offset = 0;
    for (_, nodes, tris) in parts {
        for t in tris {
            writeln!(s, "{} {} {}", t[0] + offset + 1, t[1] + offset + 1, t[2] + offset + 1).unwrap();
        }
        offset += nodes.len();
    }
    for (id, _, tris) in parts {
        for _ in tris {
            writeln!(s, "{id}").unwrap();
        }
    }
    s
}

/// Two wedge wings meeting at y = 1 without sharing nodes, surface ids 11
/// and 12, the key file placing them in components 1 and 2.
pub fn wedge_pair() -> GeometrySource {
    let (n1, t1) = wedge(0.0, 1.0, 2);
    let (n2, t2) = wedge(1.0, 1.0, 2);
    GeometrySource::RawTriangulation {
        text: tri_text(&[(11, n1, t1), (12, n2, t2)]),
        key: Some("# id,comp,group,name\n2\n11,0,0,LeftWing\n12,1,0,RightWing\n".into()),
        sharp_nodes: None,
    }
}
