//! Parameter file reader (§6): a line-oriented UTF-8 text format.
//!
//! Canonical whitespace rule, resolving the ambiguity between the
//! original format's two near-duplicate extractors: leading whitespace
//! after a specifier is stripped, any trailing newline is stripped, and
//! a scalar value is the longest non-whitespace prefix of what remains.

use crate::error::{MeshError, MeshResult};
use crate::geometry::Point;

pub const DEFAULT_QTREE_CAP: usize = 100;

#[derive(Debug, Clone)]
pub struct BoundarySpec {
    pub marker: i64,
    /// `(i, j, edge_marker, size_factor)`, `i`/`j` indexing `MeshParams::nodes`.
    pub edges: Vec<(usize, usize, i64, f64)>,
}

#[derive(Debug, Clone)]
pub struct MeshParams {
    pub global_size: f64,
    pub bbox_min: Point,
    pub bbox_max: Point,
    pub qtree_cap: usize,
    pub nodes: Vec<Point>,
    pub exterior: BoundarySpec,
    pub interiors: Vec<BoundarySpec>,
}

/// Strips a `#`-to-end-of-line comment, then trailing newline/carriage
/// return. Leading/trailing plain whitespace is left for the caller to
/// strip per-field, matching the canonical whitespace rule above.
fn strip_comment(line: &str) -> &str {
    let line = line.trim_end_matches(['\n', '\r']);
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// The longest non-whitespace prefix of `s` after stripping leading
/// whitespace; the canonical scalar-value extraction rule.
fn extract_value(s: &str) -> &str {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => &s[..i],
        None => s,
    }
}

fn parse_f64(s: &str, what: &str) -> MeshResult<f64> {
    extract_value(s).parse::<f64>().map_err(|_| MeshError::InvalidInput {
        detail: format!("expected a number for {what}, got {:?}", extract_value(s)),
    })
}

fn parse_csv_f64(s: &str, expect: usize, what: &str) -> MeshResult<Vec<f64>> {
    let vals: Result<Vec<f64>, _> = s.trim().split(',').map(|p| p.trim().parse::<f64>()).collect();
    let vals = vals.map_err(|_| MeshError::InvalidInput {
        detail: format!("malformed comma-separated list for {what}: {s:?}"),
    })?;
    if vals.len() != expect {
        return Err(MeshError::InvalidInput {
            detail: format!("{what} expects {expect} values, got {}", vals.len()),
        });
    }
    Ok(vals)
}

/// Parses `body_marker` out of a specifier like `Define exterior
/// boundary: 3`, after the known prefix has already been stripped.
fn parse_marker(rest: &str) -> MeshResult<i64> {
    extract_value(rest)
        .parse::<i64>()
        .map_err(|_| MeshError::InvalidInput {
            detail: format!("expected an integer marker, got {:?}", extract_value(rest)),
        })
}

fn parse_boundary_edge_line(line: &str) -> MeshResult<(usize, usize, i64, f64)> {
    let parts: Vec<&str> = line.trim().split(',').map(|p| p.trim()).collect();
    if parts.len() != 4 {
        return Err(MeshError::InvalidInput {
            detail: format!("boundary edge line expects 4 fields `i, j, marker, size_factor`, got {line:?}"),
        });
    }
    let i = parts[0].parse::<usize>().map_err(|_| MeshError::InvalidInput {
        detail: format!("bad node index {:?}", parts[0]),
    })?;
    let j = parts[1].parse::<usize>().map_err(|_| MeshError::InvalidInput {
        detail: format!("bad node index {:?}", parts[1]),
    })?;
    let marker = parts[2].parse::<i64>().map_err(|_| MeshError::InvalidInput {
        detail: format!("bad edge marker {:?}", parts[2]),
    })?;
    let size_factor = parts[3].parse::<f64>().map_err(|_| MeshError::InvalidInput {
        detail: format!("bad size factor {:?}", parts[3]),
    })?;
    Ok((i, j, marker, size_factor))
}

/// Parses a boundary block's body lines until `end_marker` is seen
/// (matched exactly, after comment-stripping and trimming). An
/// unterminated block is `InvalidInput`.
fn parse_boundary_block<'a, I: Iterator<Item = &'a str>>(
    lines: &mut std::iter::Peekable<I>,
    marker: i64,
    end_marker: &str,
) -> MeshResult<BoundarySpec> {
    let mut edges = Vec::new();
    loop {
        let Some(raw) = lines.next() else {
            return Err(MeshError::InvalidInput {
                detail: format!("unterminated boundary block, expected {end_marker:?}"),
            });
        };
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        if line == end_marker {
            break;
        }
        edges.push(parse_boundary_edge_line(line)?);
    }
    Ok(BoundarySpec { marker, edges })
}

/// Parses a full parameter file.
pub fn parse(input: &str) -> MeshResult<MeshParams> {
    let mut global_size: Option<f64> = None;
    let mut bbox: Option<(Point, Point)> = None;
    let mut qtree_cap = DEFAULT_QTREE_CAP;
    let mut nodes: Vec<Point> = Vec::new();
    let mut exterior: Option<BoundarySpec> = None;
    let mut interiors: Vec<BoundarySpec> = Vec::new();

    let mut lines = input.lines().peekable();
    while let Some(raw) = lines.next() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("Global element size:") {
            global_size = Some(parse_f64(rest, "Global element size")?);
        } else if let Some(rest) = line.strip_prefix("Mesh bounding box:") {
            let vals = parse_csv_f64(rest, 4, "Mesh bounding box")?;
            bbox = Some((Point::new(vals[0], vals[1]), Point::new(vals[2], vals[3])));
        } else if let Some(rest) = line.strip_prefix("Number of quadtree elements:") {
            qtree_cap = extract_value(rest).parse::<usize>().map_err(|_| MeshError::InvalidInput {
                detail: format!("expected an integer for quadtree elements, got {:?}", extract_value(rest)),
            })?;
        } else if line.strip_prefix("Define nodes:").is_some() {
            loop {
                let Some(raw_line) = lines.next() else {
                    return Err(MeshError::InvalidInput {
                        detail: "unterminated node block, expected \"End nodes\"".into(),
                    });
                };
                let l = strip_comment(raw_line).trim();
                if l.is_empty() {
                    continue;
                }
                if l == "End nodes" {
                    break;
                }
                let vals = parse_csv_f64(l, 2, "node coordinates")?;
                nodes.push(Point::new(vals[0], vals[1]));
            }
        } else if let Some(rest) = line.strip_prefix("Define exterior boundary:") {
            if exterior.is_some() {
                return Err(MeshError::InvalidInput {
                    detail: "more than one exterior boundary defined".into(),
                });
            }
            let marker = parse_marker(rest)?;
            exterior = Some(parse_boundary_block(&mut lines, marker, "End exterior boundary")?);
        } else if let Some(rest) = line.strip_prefix("Define interior boundary:") {
            let marker = parse_marker(rest)?;
            interiors.push(parse_boundary_block(&mut lines, marker, "End interior boundary")?);
        } else {
            return Err(MeshError::InvalidInput {
                detail: format!("unrecognized line: {line:?}"),
            });
        }
    }

    let global_size = global_size.ok_or_else(|| MeshError::InvalidInput {
        detail: "missing required \"Global element size:\"".into(),
    })?;
    let (bbox_min, bbox_max) = bbox.ok_or_else(|| MeshError::InvalidInput {
        detail: "missing required \"Mesh bounding box:\"".into(),
    })?;
    let exterior = exterior.ok_or_else(|| MeshError::InvalidInput {
        detail: "missing required \"Define exterior boundary:\" block".into(),
    })?;

    for spec in std::iter::once(&exterior).chain(interiors.iter()) {
        for &(i, j, _, _) in &spec.edges {
            if i >= nodes.len() || j >= nodes.len() {
                return Err(MeshError::InvalidInput {
                    detail: format!("boundary edge references out-of-range node index ({i}, {j})"),
                });
            }
        }
    }

    Ok(MeshParams {
        global_size,
        bbox_min,
        bbox_max,
        qtree_cap,
        nodes,
        exterior,
        interiors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "\
# a unit square\n\
Global element size: 0.5\n\
Mesh bounding box: -1, -1, 2, 2\n\
Define nodes:\n\
0, 0\n\
1, 0 # trailing comment\n\
1, 1\n\
0, 1\n\
End nodes\n\
Define exterior boundary: 1\n\
0, 1, 10, 1.0\n\
1, 2, 10, 1.0\n\
2, 3, 10, 1.0\n\
3, 0, 10, 1.0\n\
End exterior boundary\n\
";

    #[test]
    fn parses_minimal_square() {
        let p = parse(SQUARE).unwrap();
        assert_eq!(p.global_size, 0.5);
        assert_eq!(p.nodes.len(), 4);
        assert_eq!(p.exterior.edges.len(), 4);
        assert_eq!(p.qtree_cap, DEFAULT_QTREE_CAP);
    }

    #[test]
    fn missing_global_size_is_invalid() {
        let bad = SQUARE.replacen("Global element size: 0.5\n", "", 1);
        assert!(parse(&bad).is_err());
    }

    #[test]
    fn out_of_range_node_index_is_invalid() {
        let bad = SQUARE.replace("3, 0, 10, 1.0", "9, 0, 10, 1.0");
        assert!(parse(&bad).is_err());
    }

    #[test]
    fn unterminated_block_is_invalid() {
        let bad = SQUARE.replace("End exterior boundary\n", "");
        assert!(parse(&bad).is_err());
    }

    #[test]
    fn interior_boundary_is_optional_and_repeatable() {
        let mut text = SQUARE.to_string();
        text.push_str("Define interior boundary: 2\nEnd interior boundary\n");
        let p = parse(&text).unwrap();
        assert_eq!(p.interiors.len(), 1);
        assert!(p.interiors[0].edges.is_empty());
    }
}
