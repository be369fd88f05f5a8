//! Wavefront OBJ reader.
//!
//! Supports `v` (optionally followed by an RGB colour), `vt`, `vn` and `f`
//! records with `p`, `p/t`, `p//n` and `p/t/n` corners, 1-based or negative
//! indices and arbitrary convex polygons. Every `o` or `g` record starts a new
//! sub-mesh. Materials and smoothing groups are ignored.

use anyhow::Result;
use cgmath::{InnerSpace, Vector2, Vector3, Zero};

use crate::error::Error;
use crate::render::mesh::{MeshData, Vertex};

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

pub fn load_obj(path: &std::path::Path) -> Result<Vec<MeshData>> {
    log::info!("Loading mesh {}", path.display());

    let contents = std::fs::read_to_string(path).map_err(|error| {
        Error::resource_load(format!("Failed to read {}: {error}", path.display()))
    })?;

    parse_obj(&contents)
        .map_err(|error| Error::resource_load(format!("{}: {error}", path.display())).into())
}

pub fn parse_obj(contents: &str) -> Result<Vec<MeshData>> {
    let mut parser = ObjParser::default();

    for (line_index, line) in contents.lines().enumerate() {
        parser.parse_line(line_index + 1, line)?;
    }

    Ok(parser.finish())
}

#[derive(Clone, Copy)]
struct Corner {
    position: usize,
    tex_coord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Default)]
struct ObjParser {
    positions: Vec<Vector3<f32>>,
    colours: Vec<[f32; 3]>,
    tex_coords: Vec<Vector2<f32>>,
    normals: Vec<Vector3<f32>>,
    meshes: Vec<MeshData>,
    current: MeshData,
}

impl ObjParser {
    fn parse_line(&mut self, line_number: usize, line: &str) -> Result<()> {
        let line = match line.split_once('#') {
            Some((content, _)) => content,
            None => line,
        };

        let mut tokens = line.split_whitespace();
        let keyword = match tokens.next() {
            Some(keyword) => keyword,
            None => return Ok(()),
        };
        let arguments = tokens.collect::<Vec<_>>();

        match keyword {
            "v" => {
                let values = parse_floats(line_number, &arguments, 3)?;
                self.positions
                    .push(Vector3::new(values[0], values[1], values[2]));
                self.colours.push(if values.len() >= 6 {
                    [values[3], values[4], values[5]]
                } else {
                    WHITE
                });
            }
            "vt" => {
                let values = parse_floats(line_number, &arguments, 1)?;
                self.tex_coords.push(Vector2::new(
                    values[0],
                    values.get(1).copied().unwrap_or(0.0),
                ));
            }
            "vn" => {
                let values = parse_floats(line_number, &arguments, 3)?;
                self.normals
                    .push(Vector3::new(values[0], values[1], values[2]));
            }
            "f" => self.parse_face(line_number, &arguments)?,
            "o" | "g" => {
                let name = arguments.join(" ");
                if self.current.vertices.is_empty() {
                    self.current.name = name;
                } else {
                    let finished = std::mem::replace(
                        &mut self.current,
                        MeshData {
                            name,
                            ..Default::default()
                        },
                    );
                    self.meshes.push(finished);
                }
            }
            _ => log::debug!("Ignoring OBJ record {keyword} on line {line_number}"),
        }

        Ok(())
    }

    fn parse_face(&mut self, line_number: usize, arguments: &[&str]) -> Result<()> {
        if arguments.len() < 3 {
            return Err(Error::resource_load(format!(
                "Face on line {line_number} has {} corners, at least 3 are required",
                arguments.len()
            ))
            .into());
        }

        let corners = arguments
            .iter()
            .map(|argument| self.parse_corner(line_number, argument))
            .collect::<Result<Vec<_>>>()?;

        // Fan around the first corner.
        for index in 1..corners.len() - 1 {
            self.push_triangle([corners[0], corners[index], corners[index + 1]]);
        }

        Ok(())
    }

    fn parse_corner(&self, line_number: usize, argument: &str) -> Result<Corner> {
        let mut parts = argument.split('/');

        let position = match parts.next() {
            Some(part) if !part.is_empty() => {
                resolve_index(line_number, part, self.positions.len(), "position")?
            }
            _ => {
                return Err(Error::resource_load(format!(
                    "Face corner {argument} on line {line_number} has no position index"
                ))
                .into())
            }
        };

        let tex_coord = match parts.next() {
            Some(part) if !part.is_empty() => Some(resolve_index(
                line_number,
                part,
                self.tex_coords.len(),
                "texture coordinate",
            )?),
            _ => None,
        };

        let normal = match parts.next() {
            Some(part) if !part.is_empty() => Some(resolve_index(
                line_number,
                part,
                self.normals.len(),
                "normal",
            )?),
            _ => None,
        };

        Ok(Corner {
            position,
            tex_coord,
            normal,
        })
    }

    fn push_triangle(&mut self, corners: [Corner; 3]) {
        let positions = corners.map(|corner| self.positions[corner.position]);
        let tex_coords = corners.map(|corner| match corner.tex_coord {
            Some(index) => self.tex_coords[index],
            None => Vector2::zero(),
        });

        let face_normal = (positions[1] - positions[0]).cross(positions[2] - positions[0]);
        let face_normal = if face_normal.magnitude2() > f32::EPSILON {
            face_normal.normalize()
        } else {
            Vector3::unit_y()
        };

        let (face_tangent, face_bitangent) = triangle_tangents(positions, tex_coords);

        for (slot, corner) in corners.iter().enumerate() {
            let normal = match corner.normal {
                Some(index) if self.normals[index].magnitude2() > f32::EPSILON => {
                    self.normals[index].normalize()
                }
                _ => face_normal,
            };

            let (tangent, bitangent) = orthonormal_tangents(normal, face_tangent, face_bitangent);

            self.current.vertices.push(Vertex {
                position: positions[slot].into(),
                colour: self.colours[corner.position],
                tex_coord: tex_coords[slot].into(),
                normal: normal.into(),
                tangent: tangent.into(),
                bitangent: bitangent.into(),
            });
        }
    }

    fn finish(mut self) -> Vec<MeshData> {
        let current = std::mem::take(&mut self.current);
        self.meshes.push(current);

        self.meshes
            .into_iter()
            .filter(|mesh| !mesh.vertices.is_empty())
            .collect()
    }
}

fn parse_floats(line_number: usize, arguments: &[&str], minimum: usize) -> Result<Vec<f32>> {
    if arguments.len() < minimum {
        return Err(Error::resource_load(format!(
            "Expected at least {minimum} values on line {line_number}, found {}",
            arguments.len()
        ))
        .into());
    }

    arguments
        .iter()
        .map(|argument| {
            argument.parse::<f32>().map_err(|error| {
                anyhow::Error::from(Error::resource_load(format!(
                    "Invalid number {argument} on line {line_number}: {error}"
                )))
            })
        })
        .collect()
}

/// Converts a 1-based or negative (relative to the end) OBJ index into a
/// 0-based one.
fn resolve_index(line_number: usize, part: &str, count: usize, what: &str) -> Result<usize> {
    let index = part.parse::<i64>().map_err(|error| {
        Error::resource_load(format!(
            "Invalid {what} index {part} on line {line_number}: {error}"
        ))
    })?;

    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        count as i64 + index
    } else {
        -1
    };

    if resolved < 0 || resolved >= count as i64 {
        return Err(Error::resource_load(format!(
            "The {what} index {index} on line {line_number} is out of range (count={count})"
        ))
        .into());
    }

    Ok(resolved as usize)
}

/// Unnormalized tangent and bitangent from the UV deltas of a triangle, or
/// `None` when the UV mapping is degenerate.
fn triangle_tangents(
    positions: [Vector3<f32>; 3],
    tex_coords: [Vector2<f32>; 3],
) -> (Option<Vector3<f32>>, Option<Vector3<f32>>) {
    let edge_1 = positions[1] - positions[0];
    let edge_2 = positions[2] - positions[0];
    let delta_uv_1 = tex_coords[1] - tex_coords[0];
    let delta_uv_2 = tex_coords[2] - tex_coords[0];

    let determinant = delta_uv_1.x * delta_uv_2.y - delta_uv_2.x * delta_uv_1.y;
    if determinant.abs() < 1e-8 {
        return (None, None);
    }

    let inverse = 1.0 / determinant;

    (
        Some((edge_1 * delta_uv_2.y - edge_2 * delta_uv_1.y) * inverse),
        Some((edge_2 * delta_uv_1.x - edge_1 * delta_uv_2.x) * inverse),
    )
}

/// Gram-Schmidt of the face tangent against `normal`, keeping the face's
/// handedness. Falls back to an arbitrary basis around the normal.
fn orthonormal_tangents(
    normal: Vector3<f32>,
    tangent: Option<Vector3<f32>>,
    bitangent: Option<Vector3<f32>>,
) -> (Vector3<f32>, Vector3<f32>) {
    if let (Some(tangent), Some(bitangent)) = (tangent, bitangent) {
        let projected = tangent - normal * normal.dot(tangent);

        if projected.magnitude2() > 1e-12 {
            let tangent = projected.normalize();
            let mut orthogonal_bitangent = normal.cross(tangent);
            if orthogonal_bitangent.dot(bitangent) < 0.0 {
                orthogonal_bitangent = -orthogonal_bitangent;
            }

            return (tangent, orthogonal_bitangent);
        }
    }

    let axis = if normal.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let tangent = (axis - normal * normal.dot(axis)).normalize();

    (tangent, normal.cross(tangent))
}
