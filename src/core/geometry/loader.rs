use std::{
    fs,
    path::{Path, PathBuf},
};

use glam::Vec3;
use log::{debug, info};

use super::{process, Mesh, Vertex};
use crate::error::LoadError;

/// Reads only the `v x y z` lines of an OBJ-like text file. Faces and every
/// other record are ignored; each position becomes an independent point.
pub fn load_points(path: &Path) -> Result<Mesh, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;

    let vertices: Vec<Vertex> = text
        .lines()
        .filter_map(parse_position)
        .map(Vertex::point)
        .collect();
    if vertices.is_empty() {
        return Err(LoadError::NoVertices(path.to_owned()));
    }

    info!("loaded {} points from {}", vertices.len(), path.display());
    Ok(Mesh::points(vertices))
}

/// A position record starts in the first column: `v`, whitespace, three floats.
fn parse_position(line: &str) -> Option<Vec3> {
    let rest = line.strip_prefix('v')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let mut tokens = rest.split_whitespace();
    let mut coord = || tokens.next()?.parse::<f32>().ok();
    Some(Vec3::new(coord()?, coord()?, coord()?))
}

/// Imports every model of an OBJ file into one triangulated mesh.
///
/// Identical position/normal/uv tuples are merged by the importer. When the
/// file does not carry a normal for every vertex, normals are generated from
/// the faces.
pub fn load_mesh(path: &Path) -> Result<Mesh, LoadError> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| import_error(path, source))?;

    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut has_all_normals = true;

    for model in &models {
        let mesh = &model.mesh;
        let base = positions.len() as u32;
        let count = mesh.positions.len() / 3;

        positions.extend(mesh.positions.chunks_exact(3).map(Vec3::from_slice));
        if mesh.normals.len() == mesh.positions.len() {
            normals.extend(mesh.normals.chunks_exact(3).map(Vec3::from_slice));
        } else {
            has_all_normals = false;
        }
        indices.extend(mesh.indices.iter().map(|i| i + base));

        debug!(
            "model '{}': {} vertices, {} faces",
            model.name,
            count,
            mesh.indices.len() / 3
        );
    }

    if positions.is_empty() {
        // The importer drops models without faces, so bare positions vanish.
        return Err(if has_positions(path) {
            LoadError::NoFaces(path.to_owned())
        } else {
            LoadError::NoVertices(path.to_owned())
        });
    }
    if indices.len() < 3 {
        return Err(LoadError::NoFaces(path.to_owned()));
    }

    let normals = if has_all_normals {
        normals.into_iter().map(|n| n.normalize_or_zero()).collect()
    } else {
        debug!("{} lacks normals, generating them", path.display());
        process::compute_normals(&positions, &indices)
    };

    let vertices = positions
        .into_iter()
        .zip(normals)
        .map(|(pos, normal)| Vertex::new(pos, normal))
        .collect();

    let mesh = Mesh::triangles(vertices, indices)?;
    info!(
        "loaded {} vertices, {} faces from {}",
        mesh.vertices().len(),
        mesh.face_count(),
        path.display()
    );
    Ok(mesh)
}

fn has_positions(path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|text| text.lines().any(|l| parse_position(l).is_some()))
}

fn import_error(path: &Path, source: tobj::LoadError) -> LoadError {
    let path: PathBuf = path.to_owned();
    match source {
        tobj::LoadError::OpenFileFailed | tobj::LoadError::ReadError => LoadError::Io {
            source: std::io::Error::new(std::io::ErrorKind::Other, source.to_string()),
            path,
        },
        source => LoadError::Import { path, source },
    }
}
