//! Valve Map Format document generation.
//!
//! Builds VMF documents from axis-aligned brush solids and entities. The
//! output is consumed by the Hammer level editor, so property ordering and
//! the texture-axis wire format are token-exact.
//!
//! https://developer.valvesoftware.com/wiki/Valve_Map_Format

use glam::Vec3;

use crate::kv::KVNode;

pub const DEFAULT_MATERIAL: &str = "TOOLS/TOOLSNODRAW";

/// Formats a coordinate the way the editor expects. Collapses `-0` to `0`,
/// which negated axis vectors otherwise produce.
fn fmt_coord(v: f32) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        v.to_string()
    }
}

/// Faces of an axis-aligned solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Top,
    Bottom,
    West,
    East,
    North,
    South,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Top,
        Face::Bottom,
        Face::West,
        Face::East,
        Face::North,
        Face::South,
    ];
}

/// Document-scoped ID sequence. Solid, side and entity ids all interleave
/// from this one counter and are never reused.
#[derive(Debug)]
struct IdCounter(u32);

impl IdCounter {
    fn next(&mut self) -> u32 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// One planar face of a solid, with the texture axes derived from its three
/// defining points.
#[derive(Debug, Clone)]
pub struct VmfSide {
    node: KVNode,
    normal: Vec3,
    u: Vec3,
    v: Vec3,
    offset_x: f32,
    offset_y: f32,
    scale: f32,
}

impl VmfSide {
    fn new(id: u32, plane: [Vec3; 3], material: &str) -> Self {
        let [p1, p2, p3] = plane;
        let dir1 = p1 - p2;
        let dir2 = p3 - p2;

        let mut side = Self {
            node: KVNode::new("side"),
            normal: dir1.cross(dir2).normalize(),
            u: dir1.normalize(),
            v: -dir2.normalize(),
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 0.0,
        };

        side.set_texture(0.0, 0.0, 0.25);
        side.node.set_property("id", id);
        side.node.set_property(
            "plane",
            format!(
                "({} {} {}) ({} {} {}) ({} {} {})",
                fmt_coord(p1.x),
                fmt_coord(p1.y),
                fmt_coord(p1.z),
                fmt_coord(p2.x),
                fmt_coord(p2.y),
                fmt_coord(p2.z),
                fmt_coord(p3.x),
                fmt_coord(p3.y),
                fmt_coord(p3.z),
            ),
        );
        side.node.set_property("material", material);
        side.node.set_property("rotation", "0");
        side.node.set_property("lightmapscale", "16");
        side.node.set_property("smoothing_groups", "0");
        side
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn u(&self) -> Vec3 {
        self.u
    }

    pub fn v(&self) -> Vec3 {
        self.v
    }

    pub fn set_material(&mut self, material: &str) {
        self.node.set_property("material", material);
    }

    pub fn set_texture(&mut self, offset_x: f32, offset_y: f32, scale: f32) {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self.scale = scale;
        self.update_axis();
    }

    /// Flips both texture axes in place. The north face of an axis-aligned
    /// solid needs this, the Hammer viewport is top-down with +Y up.
    pub fn invert_uv(&mut self) {
        self.u = -self.u;
        self.v = -self.v;
        self.update_axis();
    }

    fn update_axis(&mut self) {
        self.node.set_property(
            "uaxis",
            format!(
                "[{} {} {} {}] {}",
                fmt_coord(self.u.x),
                fmt_coord(self.u.y),
                fmt_coord(self.u.z),
                fmt_coord(self.offset_x),
                fmt_coord(self.scale),
            ),
        );
        self.node.set_property(
            "vaxis",
            format!(
                "[{} {} {} {}] {}",
                fmt_coord(self.v.x),
                fmt_coord(self.v.y),
                fmt_coord(self.v.z),
                fmt_coord(self.offset_y),
                fmt_coord(self.scale),
            ),
        );
    }

    pub fn node(&self) -> &KVNode {
        &self.node
    }
}

/// An axis-aligned box solid with six derived sides.
#[derive(Debug, Clone)]
pub struct VmfSolid {
    node: KVNode,
    sides: [VmfSide; 6],
}

impl VmfSolid {
    #[allow(clippy::too_many_arguments)]
    fn new(
        ids: &mut IdCounter,
        x1: f32,
        y1: f32,
        z1: f32,
        x2: f32,
        y2: f32,
        z2: f32,
        material: &str,
    ) -> Self {
        let mut node = KVNode::new("solid");
        node.set_property("id", ids.next());

        let p = |x, y, z| Vec3::new(x, y, z);

        // Fixed face-to-corner mapping for the two opposite corners
        // (x1,y1,z1)-(x2,y2,z2). Matches the editor's own derivation, do not
        // reorder.
        let sides = [
            // top
            VmfSide::new(ids.next(), [p(x1, y2, z2), p(x2, y2, z2), p(x2, y1, z2)], material),
            // bottom
            VmfSide::new(ids.next(), [p(x1, y1, z1), p(x2, y1, z1), p(x2, y2, z1)], material),
            // west
            VmfSide::new(ids.next(), [p(x1, y2, z2), p(x1, y1, z2), p(x1, y1, z1)], material),
            // east
            VmfSide::new(ids.next(), [p(x2, y2, z1), p(x2, y1, z1), p(x2, y1, z2)], material),
            // north
            VmfSide::new(ids.next(), [p(x2, y2, z2), p(x1, y2, z2), p(x1, y2, z1)], material),
            // south
            VmfSide::new(ids.next(), [p(x2, y1, z1), p(x1, y1, z1), p(x1, y1, z2)], material),
        ];

        let mut solid = Self { node, sides };
        solid.side_mut(Face::North).invert_uv();
        solid
    }

    pub fn side(&self, face: Face) -> &VmfSide {
        &self.sides[face as usize]
    }

    pub fn side_mut(&mut self, face: Face) -> &mut VmfSide {
        &mut self.sides[face as usize]
    }

    pub fn set_material(&mut self, face: Face, material: &str) {
        self.side_mut(face).set_material(material);
    }

    pub fn set_material_all(&mut self, material: &str) {
        for face in Face::ALL {
            self.set_material(face, material);
        }
    }

    pub fn id(&self) -> &str {
        self.node.get_property("id").unwrap_or_default()
    }

    /// Assembles the `solid` node with its six `side` children.
    pub fn to_node(&self) -> KVNode {
        let mut node = self.node.clone();
        for side in &self.sides {
            node.add_child(side.node.clone());
        }
        node
    }
}

/// A point or brush entity.
#[derive(Debug, Clone)]
pub struct VmfEntity {
    node: KVNode,
    solids: Vec<VmfSolid>,
}

impl VmfEntity {
    fn new(id: u32, classname: &str) -> Self {
        let mut node = KVNode::new("entity");
        node.set_property("classname", classname);
        node.set_property("id", id);
        Self {
            node,
            solids: Vec::new(),
        }
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl ToString) {
        self.node.set_property(name, value);
    }

    pub fn get_property(&self, name: &str) -> Option<&str> {
        self.node.get_property(name)
    }

    pub fn solids(&self) -> &[VmfSolid] {
        &self.solids
    }

    pub fn solids_mut(&mut self) -> &mut [VmfSolid] {
        &mut self.solids
    }

    pub fn to_node(&self) -> KVNode {
        let mut node = self.node.clone();
        for solid in &self.solids {
            node.add_child(solid.to_node());
        }
        node
    }
}

/// A VMF document: the fixed top-level sections, world brush solids and
/// appended entities.
#[derive(Debug)]
pub struct Vmf {
    versioninfo: KVNode,
    visgroups: KVNode,
    world: KVNode,
    cameras: KVNode,
    cordons: KVNode,
    solids: Vec<VmfSolid>,
    entities: Vec<VmfEntity>,
    ids: IdCounter,
}

impl Default for Vmf {
    fn default() -> Self {
        Self::new()
    }
}

impl Vmf {
    pub fn new() -> Self {
        let mut versioninfo = KVNode::new("versioninfo");
        versioninfo.set_property("editorversion", 0);
        versioninfo.set_property("editorbuild", 0);
        versioninfo.set_property("mapversion", 1);
        versioninfo.set_property("formatversion", 100);
        versioninfo.set_property("prefab", 0);

        let mut world = KVNode::new("world");
        world.set_property("id", 1);
        world.set_property("mapversion", 1);
        world.set_property("classname", "worldspawn");
        world.set_property("skyname", "sky_black_nofog");
        world.set_property("maxpropscreenwidth", -1);
        world.set_property("detailvbsp", "detail.vbsp");
        world.set_property("detailmaterial", "detail/detailsprites");
        world.set_property("maxblobcount", 250);

        let mut cameras = KVNode::new("cameras");
        cameras.set_property("activecamera", -1);

        let mut cordons = KVNode::new("cordons");
        cordons.set_property("active", 0);

        Self {
            versioninfo,
            visgroups: KVNode::new("visgroups"),
            world,
            cameras,
            cordons,
            solids: Vec::new(),
            entities: Vec::new(),
            // world is id 1
            ids: IdCounter(2),
        }
    }

    /// Adds an axis-aligned box solid to the world, built from two opposite
    /// corner points.
    pub fn create_solid(
        &mut self,
        x1: f32,
        y1: f32,
        z1: f32,
        x2: f32,
        y2: f32,
        z2: f32,
    ) -> &mut VmfSolid {
        let solid = VmfSolid::new(&mut self.ids, x1, y1, z1, x2, y2, z2, DEFAULT_MATERIAL);
        self.solids.push(solid);
        self.solids.last_mut().unwrap()
    }

    pub fn create_entity<K, V>(
        &mut self,
        classname: &str,
        properties: impl IntoIterator<Item = (K, V)>,
    ) -> &mut VmfEntity
    where
        K: Into<String>,
        V: ToString,
    {
        let mut entity = VmfEntity::new(self.ids.next(), classname);
        for (k, v) in properties {
            entity.set_property(k, v);
        }
        self.entities.push(entity);
        self.entities.last_mut().unwrap()
    }

    /// Adds a `func_detail` brush entity owning its own solid.
    pub fn create_func_detail(
        &mut self,
        x1: f32,
        y1: f32,
        z1: f32,
        x2: f32,
        y2: f32,
        z2: f32,
    ) -> &mut VmfEntity {
        let mut entity = VmfEntity::new(self.ids.next(), "func_detail");
        entity
            .solids
            .push(VmfSolid::new(&mut self.ids, x1, y1, z1, x2, y2, z2, DEFAULT_MATERIAL));
        self.entities.push(entity);
        self.entities.last_mut().unwrap()
    }

    pub fn solids(&self) -> &[VmfSolid] {
        &self.solids
    }

    pub fn solids_mut(&mut self) -> &mut [VmfSolid] {
        &mut self.solids
    }

    pub fn entities(&self) -> &[VmfEntity] {
        &self.entities
    }

    /// Serializes the document: the fixed sections in editor order, world
    /// solids inside `world`, entities appended after `cordons`.
    pub fn to_text(&self) -> String {
        let mut world = self.world.clone();
        for solid in &self.solids {
            world.add_child(solid.to_node());
        }

        let mut out = String::new();
        out.push_str(&self.versioninfo.to_text(0));
        out.push_str(&self.visgroups.to_text(0));
        out.push_str(&world.to_text(0));
        out.push_str(&self.cameras.to_text(0));
        out.push_str(&self.cordons.to_text(0));
        for entity in &self.entities {
            out.push_str(&entity.to_node().to_text(0));
        }
        out
    }
}

#[cfg(test)]
mod vmf_tests {
    use super::*;

    fn ids_in_document(vmf: &Vmf) -> Vec<u32> {
        fn walk(node: &crate::kv::KVNode, out: &mut Vec<u32>) {
            if let Some(id) = node.get_property("id") {
                out.push(id.parse().unwrap());
            }
            for child in node.children() {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for solid in vmf.solids() {
            walk(&solid.to_node(), &mut out);
        }
        for entity in vmf.entities() {
            walk(&entity.to_node(), &mut out);
        }
        out
    }

    #[test]
    fn ids_are_strictly_monotonic() {
        let mut vmf = Vmf::new();
        vmf.create_solid(0.0, 0.0, 0.0, 64.0, 64.0, 64.0);
        vmf.create_entity("info_player_start", [("origin", "0 0 0")]);
        vmf.create_func_detail(0.0, 0.0, 64.0, 32.0, 32.0, 96.0);

        let ids = ids_in_document(&vmf);
        // solid + 6 sides, entity, func_detail + solid + 6 sides
        assert_eq!(ids.len(), 16);
        assert_eq!(ids[0], 2);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn solid_sides_are_axis_aligned() {
        let mut vmf = Vmf::new();
        let solid = vmf.create_solid(0.0, 0.0, 0.0, 64.0, 64.0, 64.0);

        let expected = [
            (Face::Top, Vec3::Z),
            (Face::Bottom, -Vec3::Z),
            (Face::West, -Vec3::X),
            (Face::East, Vec3::X),
            (Face::North, Vec3::Y),
            (Face::South, -Vec3::Y),
        ];
        for (face, normal) in expected {
            assert_eq!(solid.side(face).normal(), normal, "{face:?}");
        }
    }

    #[test]
    fn north_side_uv_is_inverted() {
        let mut vmf = Vmf::new();
        let solid = vmf.create_solid(0.0, 0.0, 0.0, 64.0, 64.0, 64.0);

        // naive derivation for the north plane gives u = +X, v = +Z
        let north = solid.side(Face::North);
        assert_eq!(north.u(), -Vec3::X);
        assert_eq!(north.v(), -Vec3::Z);
    }

    #[test]
    fn texture_axis_wire_format() {
        let mut vmf = Vmf::new();
        let solid = vmf.create_solid(0.0, 0.0, 0.0, 64.0, 64.0, 64.0);

        let top = solid.side(Face::Top).node();
        assert_eq!(top.get_property("uaxis"), Some("[-1 0 0 0] 0.25"));
        // v = -normalize(dir2) negates a zero component, which must still
        // print as plain 0
        assert_eq!(top.get_property("vaxis"), Some("[0 1 0 0] 0.25"));
        assert_eq!(
            top.get_property("plane"),
            Some("(0 64 64) (64 64 64) (64 0 64)")
        );
    }

    #[test]
    fn side_defaults() {
        let mut vmf = Vmf::new();
        let solid = vmf.create_solid(0.0, 0.0, 0.0, 16.0, 16.0, 16.0);
        let side = solid.side(Face::Top).node();

        assert_eq!(side.get_property("material"), Some(DEFAULT_MATERIAL));
        assert_eq!(side.get_property("rotation"), Some("0"));
        assert_eq!(side.get_property("lightmapscale"), Some("16"));
        assert_eq!(side.get_property("smoothing_groups"), Some("0"));
    }

    #[test]
    fn set_material_overrides() {
        let mut vmf = Vmf::new();
        let solid = vmf.create_solid(0.0, 0.0, 0.0, 16.0, 16.0, 16.0);
        solid.set_material(Face::Top, "DEV/DEV_MEASUREGENERIC01");
        assert_eq!(
            solid.side(Face::Top).node().get_property("material"),
            Some("DEV/DEV_MEASUREGENERIC01")
        );
        assert_eq!(
            solid.side(Face::Bottom).node().get_property("material"),
            Some(DEFAULT_MATERIAL)
        );

        solid.set_material_all("DEV/DEV_BLENDMEASURE");
        for face in Face::ALL {
            assert_eq!(
                solid.side(face).node().get_property("material"),
                Some("DEV/DEV_BLENDMEASURE")
            );
        }
    }

    #[test]
    fn document_layout() {
        let mut vmf = Vmf::new();
        vmf.create_solid(0.0, 0.0, 0.0, 64.0, 64.0, 64.0);
        vmf.create_entity("light", [("origin", "32 32 32")]);

        let text = vmf.to_text();
        assert!(text.starts_with("versioninfo\n{\n\t\"editorversion\" \"0\"\n"));

        // sections appear in editor order, entities after cordons
        let order: Vec<_> = ["versioninfo", "visgroups", "world", "cameras", "cordons", "entity"]
            .iter()
            .map(|s| text.find(&format!("{s}\n{{")).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        // the document parses back as KeyValues when wrapped in a root block
        let wrapped = format!("document\n{{\n{text}}}\n");
        let parsed = crate::kv::KVNode::parse(&wrapped);
        assert_eq!(parsed.children().len(), 6);
        let world = parsed.children_by_class_name("world").next().unwrap();
        assert_eq!(world.children_by_class_name("solid").count(), 1);
        assert_eq!(
            world.children_by_class_name("solid").next().unwrap()
                .children_by_class_name("side")
                .count(),
            6
        );
    }

    #[test]
    fn func_detail_owns_its_solid() {
        let mut vmf = Vmf::new();
        let detail = vmf.create_func_detail(0.0, 0.0, 0.0, 32.0, 32.0, 32.0);
        assert_eq!(detail.get_property("classname"), Some("func_detail"));
        assert_eq!(detail.solids().len(), 1);
        assert_eq!(
            detail.to_node().children_by_class_name("solid").count(),
            1
        );
        // the solid lives on the entity, not in the world
        assert!(vmf.solids().is_empty());
    }
}
