//! Embree-style XML rendering of a [`SceneDescriptor`].
//!
//! Materials use OBJ parameter names: `Kd`, `Ks`, `Ke`, `Ka` (diffuse
//! scaled by ambient intensity), `Ns` (shininess x 128), `d` (opacity) and
//! `map_Kd` for the texture.

use std::fmt::{self, Display, Formatter};
use std::io;

use super::descriptor::{InstanceDescriptor, MaterialDescriptor, MeshDescriptor, SceneDescriptor};
use super::layout::BufferSpan;

/// Render the descriptor as an XML document.
pub fn render_xml(descriptor: &SceneDescriptor) -> String {
    XmlScene(descriptor).to_string()
}

/// Stream the descriptor as XML into `writer`.
pub fn write_xml<W: io::Write>(descriptor: &SceneDescriptor, writer: &mut W) -> io::Result<()> {
    write!(writer, "{}", XmlScene(descriptor))
}

struct XmlScene<'a>(&'a SceneDescriptor);

impl Display for XmlScene<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let scene = self.0;
        writeln!(f, "<?xml version=\"1.0\"?>")?;
        writeln!(
            f,
            "<scene name=\"{}\" binary=\"{}\" size=\"{}\">",
            Escaped(&scene.name),
            Escaped(&scene.binary),
            scene.binary_size
        )?;

        writeln!(f, "  <materials>")?;
        for (id, material) in scene.materials.iter().enumerate() {
            write_material(f, id, material)?;
        }
        writeln!(f, "  </materials>")?;

        writeln!(f, "  <meshes>")?;
        for (id, mesh) in scene.meshes.iter().enumerate() {
            write_mesh(f, id, mesh)?;
        }
        writeln!(f, "  </meshes>")?;

        writeln!(f, "  <instances>")?;
        for instance in &scene.instances {
            write_instance(f, instance)?;
        }
        writeln!(f, "  </instances>")?;

        writeln!(f, "</scene>")
    }
}

fn write_material(f: &mut Formatter<'_>, id: usize, m: &MaterialDescriptor) -> fmt::Result {
    let ambient = m.diffuse.map(|c| c * m.ambient_intensity);

    writeln!(f, "    <material id=\"{}\" name=\"{}\">", id, Escaped(&m.name))?;
    writeln!(f, "      <code>\"OBJ\"</code>")?;
    writeln!(f, "      <parameters>")?;
    write_float3(f, "Kd", m.diffuse)?;
    write_float3(f, "Ks", m.specular)?;
    write_float3(f, "Ke", m.emissive)?;
    write_float3(f, "Ka", ambient)?;
    writeln!(f, "        <float name=\"Ns\">{}</float>", m.shininess * 128.0)?;
    writeln!(f, "        <float name=\"d\">{}</float>", 1.0 - m.transparency)?;
    if let Some(texture) = &m.texture {
        writeln!(f, "        <texture name=\"map_Kd\" src=\"{}\"/>", Escaped(texture))?;
    }
    writeln!(f, "      </parameters>")?;
    writeln!(f, "    </material>")
}

fn write_float3(f: &mut Formatter<'_>, name: &str, v: [f32; 3]) -> fmt::Result {
    writeln!(f, "        <float3 name=\"{}\">{} {} {}</float3>", name, v[0], v[1], v[2])
}

fn write_mesh(f: &mut Formatter<'_>, id: usize, mesh: &MeshDescriptor) -> fmt::Result {
    writeln!(f, "    <TriangleMesh id=\"{}\" name=\"{}\">", id, Escaped(&mesh.name))?;
    write_span(f, "positions", &mesh.positions)?;
    if let Some(span) = &mesh.normals {
        write_span(f, "normals", span)?;
    }
    if let Some(span) = &mesh.colors {
        write_span(f, "colors", span)?;
    }
    if let Some(span) = &mesh.texcoords {
        write_span(f, "texcoords", span)?;
    }
    write_span(f, "triangles", &mesh.triangles)?;
    if let Some([min, max]) = &mesh.bounds {
        writeln!(
            f,
            "      <bounds min=\"{} {} {}\" max=\"{} {} {}\"/>",
            min[0], min[1], min[2], max[0], max[1], max[2]
        )?;
    }
    writeln!(f, "    </TriangleMesh>")
}

fn write_span(f: &mut Formatter<'_>, tag: &str, span: &BufferSpan) -> fmt::Result {
    writeln!(
        f,
        "      <{} ofs=\"{}\" size=\"{}\" count=\"{}\"/>",
        tag, span.offset, span.length, span.count
    )
}

fn write_instance(f: &mut Formatter<'_>, instance: &InstanceDescriptor) -> fmt::Result {
    writeln!(
        f,
        "    <Instance name=\"{}\" mesh=\"{}\" material=\"{}\">",
        Escaped(&instance.name),
        instance.mesh,
        instance.material
    )?;
    writeln!(f, "      <AffineSpace>")?;
    for row in &instance.transform {
        writeln!(f, "        {} {} {} {}", row[0], row[1], row[2], row[3])?;
    }
    writeln!(f, "      </AffineSpace>")?;
    writeln!(f, "    </Instance>")
}

/// XML attribute/text escaping.
struct Escaped<'a>(&'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&apos;")?,
                c => write!(f, "{}", c)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> SceneDescriptor {
        SceneDescriptor {
            name: "a<b>".to_string(),
            binary: "scene.bin".to_string(),
            binary_size: 48,
            materials: vec![MaterialDescriptor {
                name: "Red".to_string(),
                diffuse: [1.0, 0.0, 0.0],
                specular: [0.0; 3],
                emissive: [0.0; 3],
                ambient_intensity: 0.5,
                shininess: 0.25,
                transparency: 0.25,
                texture: Some("tex & co.png".to_string()),
            }],
            meshes: vec![MeshDescriptor {
                name: "tri".to_string(),
                positions: BufferSpan { offset: 0, length: 36, count: 3 },
                normals: None,
                colors: None,
                texcoords: None,
                triangles: BufferSpan { offset: 36, length: 12, count: 1 },
                bounds: None,
            }],
            instances: vec![InstanceDescriptor {
                name: "shape_0".to_string(),
                mesh: 0,
                material: 0,
                transform: [
                    [1.0, 0.0, 0.0, 5.0],
                    [0.0, 1.0, 0.0, 0.0],
                    [0.0, 0.0, 1.0, 0.0],
                ],
            }],
        }
    }

    #[test]
    fn test_render_xml() {
        let xml = render_xml(&descriptor());

        assert!(xml.starts_with("<?xml version=\"1.0\"?>\n"));
        assert!(xml.contains("<scene name=\"a&lt;b&gt;\" binary=\"scene.bin\" size=\"48\">"));
        assert!(xml.contains("<float3 name=\"Kd\">1 0 0</float3>"));
        assert!(xml.contains("<float3 name=\"Ka\">0.5 0 0</float3>"));
        assert!(xml.contains("<float name=\"Ns\">32</float>"));
        assert!(xml.contains("<float name=\"d\">0.75</float>"));
        assert!(xml.contains("src=\"tex &amp; co.png\""));
        assert!(xml.contains("<positions ofs=\"0\" size=\"36\" count=\"3\"/>"));
        assert!(xml.contains("<triangles ofs=\"36\" size=\"12\" count=\"1\"/>"));
        assert!(!xml.contains("<normals"));
        assert!(xml.contains("<Instance name=\"shape_0\" mesh=\"0\" material=\"0\">"));
        assert!(xml.contains("        1 0 0 5\n"));
        assert!(xml.trim_end().ends_with("</scene>"));
    }

    #[test]
    fn test_write_xml_matches_render() {
        let desc = descriptor();
        let mut bytes = Vec::new();
        write_xml(&desc, &mut bytes).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), render_xml(&desc));
    }
}
