//! MTL material parser.
//!
//! Two-pass byte walker: the first pass counts `newmtl` directives to size
//! the output, the second extracts texture-map filenames scoped to the most
//! recent material. Directives other than the recognized map names are
//! ignored; material names and paths are single whitespace-delimited
//! tokens.

use crate::scan::{lines, next_token, token_string};
use crate::types::Material;

pub(crate) fn parse_mtl(materials: &mut Vec<Material>, buffer: &[u8]) {
    let mut material_count = 0;
    for (_, line) in lines(buffer) {
        let mut pos = 0;
        if next_token(line, &mut pos) == Some(b"newmtl".as_slice()) {
            material_count += 1;
        }
    }
    materials.reserve(material_count);

    let mut current: Option<usize> = None;
    for (_, line) in lines(buffer) {
        let mut pos = 0;
        let Some(prefix) = next_token(line, &mut pos) else {
            continue;
        };
        if prefix[0] == b'#' {
            continue;
        }

        let value = next_token(line, &mut pos).unwrap_or(b"");

        if prefix == b"newmtl" {
            materials.push(Material::new(token_string(value)));
            current = Some(materials.len() - 1);
        } else if let Some(index) = current {
            if prefix == b"map_Kd" {
                materials[index].diffuse.push(token_string(value));
            } else if prefix == b"map_Ks" || prefix == b"map_Ns" {
                materials[index].specular.push(token_string(value));
            } else if prefix == b"map_Bump" || prefix == b"bump" {
                materials[index].normal.push(token_string(value));
            } else if prefix == b"disp" {
                materials[index].height.push(token_string(value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(buffer: &[u8]) -> Vec<Material> {
        let mut materials = Vec::new();
        parse_mtl(&mut materials, buffer);
        materials
    }

    #[test]
    fn test_single_material_maps() {
        let materials = parse(
            b"newmtl rock\n\
              map_Kd rock_d.png\n\
              map_Ks rock_s.png\n\
              map_Ns rock_ns.png\n\
              map_Bump rock_n.png\n\
              bump rock_b.png\n\
              disp rock_h.png\n",
        );

        assert_eq!(materials.len(), 1);
        let rock = &materials[0];
        assert_eq!(rock.name, "rock");
        assert_eq!(rock.diffuse, vec!["rock_d.png"]);
        assert_eq!(rock.specular, vec!["rock_s.png", "rock_ns.png"]);
        assert_eq!(rock.normal, vec!["rock_n.png", "rock_b.png"]);
        assert_eq!(rock.height, vec!["rock_h.png"]);
        assert!(!rock.is_tiled);
    }

    #[test]
    fn test_maps_scoped_to_most_recent_material() {
        let materials = parse(
            b"newmtl a\n\
              map_Kd a.png\n\
              newmtl b\n\
              map_Kd b.png\n",
        );

        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0].diffuse, vec!["a.png"]);
        assert_eq!(materials[1].diffuse, vec!["b.png"]);
    }

    #[test]
    fn test_leading_whitespace_and_unknown_directives() {
        let materials = parse(
            b"# comment\n\
              newmtl tiled\n\
              \tKa 1.0 1.0 1.0\n\
              \t map_Kd tiled.png\n\
              illum 2\n",
        );

        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].diffuse, vec!["tiled.png"]);
    }

    #[test]
    fn test_maps_before_any_material_are_dropped() {
        let materials = parse(b"map_Kd stray.png\nnewmtl real\n");
        assert_eq!(materials.len(), 1);
        assert!(materials[0].diffuse.is_empty());
    }

    #[test]
    fn test_empty_buffer() {
        assert!(parse(b"").is_empty());
    }
}
