//! Merging many 3MF files into one colored assembly
//!
//! Every mesh object of every source file becomes a mesh object of the
//! merged model and a component of a single root components object. The
//! color listed in a source filename is bound to each of its meshes as an
//! object-level property, and the bracketed part of the filename becomes the
//! part name.
//!
//! # Example
//!
//! ```no_run
//! use threemf_merge::{MergeConfig, Merger, Reporter};
//! # use threemf_merge::{ColorSpecError, Error, ObjectKind, ResourceId};
//! # struct Quiet;
//! # impl Reporter for Quiet {
//! #     fn color_rejected(&mut self, _: &str, _: &ColorSpecError) {}
//! #     fn object_skipped(&mut self, _: &str, _: ResourceId, _: ObjectKind) {}
//! #     fn file_skipped(&mut self, _: &str, _: &Error) {}
//! # }
//!
//! # fn main() -> threemf_merge::Result<()> {
//! let mut merger = Merger::new(MergeConfig::new());
//! let skipped = merger.merge_lines(["base.3mf", "lid[1, 0, 0, 1].3mf"], &mut Quiet);
//! let merged = merger.finish()?;
//! merged.model.write_to_file("out.3mf")?;
//! # let _ = skipped;
//! # Ok(())
//! # }
//! ```

use crate::canonical;
use crate::color::{ColorSpec, ColorSpecError, bracketed_name};
use crate::error::{Error, Result};
use crate::model::{
    Color, IDENTITY_TRANSFORM, Mesh, Model, Object, ObjectKind, ResourceId, Triangle,
};
use crate::model_settings::{MODEL_SETTINGS_CONTENT_TYPE, MODEL_SETTINGS_PATH, render_model_settings};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Optional merge features
///
/// All features are enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeConfig {
    srgb_encode: bool,
    model_settings: bool,
    name_components: bool,
}

impl MergeConfig {
    /// Create a configuration with every feature enabled
    pub fn new() -> Self {
        Self {
            srgb_encode: true,
            model_settings: true,
            name_components: true,
        }
    }

    /// Encode filename colors from linear light to sRGB
    pub fn with_srgb_encoding(mut self, enabled: bool) -> Self {
        self.srgb_encode = enabled;
        self
    }

    /// Attach the part-name document for slicers
    pub fn with_model_settings(mut self, enabled: bool) -> Self {
        self.model_settings = enabled;
        self
    }

    /// Name every merged mesh object after the bracketed part of its filename
    pub fn with_component_names(mut self, enabled: bool) -> Self {
        self.name_components = enabled;
        self
    }

    /// Whether colors are sRGB encoded
    pub fn srgb_encoding(&self) -> bool {
        self.srgb_encode
    }

    /// Whether the part-name document is attached
    pub fn model_settings(&self) -> bool {
        self.model_settings
    }

    /// Whether merged mesh objects are named
    pub fn component_names(&self) -> bool {
        self.name_components
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives the events a merge run reports to its user
///
/// `line` is always the input line exactly as given to the merger.
pub trait Reporter {
    /// The filename carried no usable color; its meshes stay uncolored
    fn color_rejected(&mut self, line: &str, error: &ColorSpecError);

    /// A top-level object of the file was not merged
    fn object_skipped(&mut self, line: &str, object_id: ResourceId, kind: ObjectKind);

    /// The file could not be merged at all
    fn file_skipped(&mut self, line: &str, error: &Error);
}

/// Result of merging one input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was read; `meshes` of its objects were merged
    Merged {
        /// Number of merged mesh objects
        meshes: usize,
    },
    /// The file failed and counts as skipped
    Skipped,
}

/// The finished merge
#[derive(Debug, Clone)]
pub struct MergedModel {
    /// Model ready to be written
    pub model: Model,
    /// ID of the components object holding every merged mesh
    pub root_id: ResourceId,
    /// Part names by mesh object ID
    pub names: BTreeMap<ResourceId, String>,
    /// Number of input lines that were skipped
    pub skipped: usize,
}

/// Accumulates source files into one model
#[derive(Debug)]
pub struct Merger {
    config: MergeConfig,
    model: Model,
    root_id: ResourceId,
    names: BTreeMap<ResourceId, String>,
    color_groups: HashMap<Color, ResourceId>,
    skipped: usize,
}

impl Merger {
    /// Start a merge with an empty root components object
    pub fn new(config: MergeConfig) -> Self {
        let mut model = Model::new();
        let root_id = model.add_components_object();
        tracing::debug!(root_id, ?config, "created merged model");

        Self {
            config,
            model,
            root_id,
            names: BTreeMap::new(),
            color_groups: HashMap::new(),
            skipped: 0,
        }
    }

    /// ID of the root components object
    pub fn root_id(&self) -> ResourceId {
        self.root_id
    }

    /// The model merged so far
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Part names recorded so far, by mesh object ID
    pub fn names(&self) -> &BTreeMap<ResourceId, String> {
        &self.names
    }

    /// Number of input lines skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Merge every line in order and return the total skip count
    pub fn merge_lines<I, S>(&mut self, lines: I, reporter: &mut dyn Reporter) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.merge_file(line.as_ref(), reporter);
        }
        self.skipped
    }

    /// Merge the 3MF file named by `line`
    ///
    /// Failures are reported and counted, never returned: one bad input does
    /// not stop the run.
    pub fn merge_file(&mut self, line: &str, reporter: &mut dyn Reporter) -> FileOutcome {
        self.merge_path(line, Path::new(line), reporter)
    }

    /// Merge the 3MF file at `path`
    ///
    /// `line` supplies the color and part name and is what gets reported.
    /// It differs from `path` only when the input line is not valid UTF-8.
    pub fn merge_path(
        &mut self,
        line: &str,
        path: &Path,
        reporter: &mut dyn Reporter,
    ) -> FileOutcome {
        let color = match ColorSpec::from_filename(line) {
            Ok(spec) if self.config.srgb_encode => Some(spec.srgb_encoded()),
            Ok(spec) => Some(spec),
            Err(err) => {
                reporter.color_rejected(line, &err);
                None
            }
        };
        let name = bracketed_name(line).unwrap_or_default();

        let outcome = Model::read_from_file(path)
            .and_then(|source| self.merge_source(line, source, color, name, reporter));

        match outcome {
            Ok(meshes) => {
                tracing::info!(file = line, meshes, "merged file");
                FileOutcome::Merged { meshes }
            }
            Err(err) => self.skip_file(line, err, reporter),
        }
    }

    /// Count `line` as skipped because of `error`, without reading anything
    pub fn skip_file(
        &mut self,
        line: &str,
        error: Error,
        reporter: &mut dyn Reporter,
    ) -> FileOutcome {
        self.skipped += 1;
        tracing::debug!(file = line, error = %error, "skipping file");
        reporter.file_skipped(line, &error);
        FileOutcome::Skipped
    }

    fn merge_source(
        &mut self,
        line: &str,
        source: Model,
        color: Option<ColorSpec>,
        name: &str,
        reporter: &mut dyn Reporter,
    ) -> Result<usize> {
        let mut meshes = 0;

        for object in source.resources.objects {
            match object.kind() {
                ObjectKind::Mesh => {
                    self.merge_mesh(object, color, name)?;
                    meshes += 1;
                }
                kind => {
                    tracing::trace!(file = line, object_id = object.id, ?kind, "object not merged");
                    reporter.object_skipped(line, object.id, kind);
                }
            }
        }

        Ok(meshes)
    }

    fn merge_mesh(&mut self, object: Object, color: Option<ColorSpec>, name: &str) -> Result<()> {
        let source_id = object.id;
        let Some(source_mesh) = object.mesh else {
            return Err(Error::InvalidModel(format!(
                "Object {} has no mesh",
                source_id
            )));
        };

        // Per-triangle properties refer to the source model's resources
        let mut triangles: Vec<Triangle> = source_mesh
            .triangles
            .iter()
            .map(|t| Triangle::new(t.v1, t.v2, t.v3))
            .collect();
        canonical::sort(&mut triangles);

        let mesh = Mesh {
            vertices: source_mesh.vertices,
            triangles,
        };
        let (vertex_count, triangle_count) = (mesh.vertices.len(), mesh.triangles.len());
        let id = self.model.add_mesh_object(mesh);

        if let Some(spec) = color {
            let group = self.color_group_for(spec.to_color());
            self.model.set_object_level_property(id, group, 0)?;
        }
        if self.config.name_components && !name.is_empty() {
            self.model.set_object_name(id, name)?;
        }

        self.model.add_component(self.root_id, id, IDENTITY_TRANSFORM)?;
        self.names.insert(id, name.to_string());

        tracing::debug!(
            source_id,
            id,
            vertices = vertex_count,
            triangles = triangle_count,
            "merged mesh"
        );
        Ok(())
    }

    /// Color group holding exactly `color`, created on first use
    fn color_group_for(&mut self, color: Color) -> ResourceId {
        if let Some(&id) = self.color_groups.get(&color) {
            return id;
        }
        let id = self.model.add_color_group(vec![color]);
        tracing::debug!(id, ?color, "created color group");
        self.color_groups.insert(color, id);
        id
    }

    /// Add the build item and, if enabled, the part-name document
    pub fn finish(mut self) -> Result<MergedModel> {
        self.model.add_build_item(self.root_id, IDENTITY_TRANSFORM)?;

        if self.config.model_settings {
            let settings = render_model_settings(self.root_id, &self.names);
            self.model.add_attachment(
                MODEL_SETTINGS_PATH,
                MODEL_SETTINGS_CONTENT_TYPE,
                settings.into_bytes(),
            )?;
        }

        Ok(MergedModel {
            model: self.model,
            root_id: self.root_id,
            names: self.names,
            skipped: self.skipped,
        })
    }
}
