//! Ordered operation lists applied to one [`Processor`].
//!
//! Writes are staged: each write operation encodes the processor state at its position in the
//! list into a hidden sibling file, and the staged files are moved onto their targets only after
//! every operation succeeded. A failing operation therefore leaves no output behind.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context as _;

use crate::fill::wavefront::PropagateStats;
use crate::foundation::core::FillColor;
use crate::foundation::error::{AlphaFillError, AlphaFillResult};
use crate::pipeline::processor::Processor;
use crate::raster::codec;

/// One step of a pipeline.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Wavefront propagation; `max_rounds = None` runs until the frontier is empty.
    Propagate {
        /// Round budget.
        #[serde(default)]
        max_rounds: Option<u32>,
    },
    /// Paint every unsettled pixel one color with zero alpha.
    SolidFill {
        /// Fill color, black by default.
        #[serde(default)]
        color: FillColor,
    },
    /// Write the current state.
    WriteOutput {
        /// Target file; the extension picks the format.
        path: PathBuf,
    },
    /// Write the current state with alpha forced opaque.
    WritePreview {
        /// Target file; the extension picks the format.
        path: PathBuf,
    },
}

impl Operation {
    /// True for operations that change pixel data.
    pub fn is_fill(&self) -> bool {
        matches!(self, Self::Propagate { .. } | Self::SolidFill { .. })
    }
}

impl FromStr for Operation {
    type Err = AlphaFillError;

    /// Parse a CLI token: `propagate[=N]`, `solid[=COLOR]`, `output=PATH` or `preview=PATH`.
    fn from_str(s: &str) -> AlphaFillResult<Self> {
        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        let need_path = |arg: Option<&str>| -> AlphaFillResult<PathBuf> {
            match arg {
                Some(p) if !p.is_empty() => Ok(PathBuf::from(p)),
                _ => Err(AlphaFillError::validation(format!(
                    "operation '{name}' needs a path, e.g. '{name}=out.png'"
                ))),
            }
        };

        match name.trim().to_ascii_lowercase().as_str() {
            "propagate" => {
                let max_rounds = arg
                    .map(|n| {
                        n.trim().parse::<u32>().map_err(|_| {
                            AlphaFillError::validation(format!(
                                "propagate round budget must be a non-negative integer, got '{n}'"
                            ))
                        })
                    })
                    .transpose()?;
                Ok(Self::Propagate { max_rounds })
            }
            "solid" => {
                let color = arg
                    .map(str::parse::<FillColor>)
                    .transpose()?
                    .unwrap_or_default();
                Ok(Self::SolidFill { color })
            }
            "output" => Ok(Self::WriteOutput {
                path: need_path(arg)?,
            }),
            "preview" => Ok(Self::WritePreview {
                path: need_path(arg)?,
            }),
            _ => Err(AlphaFillError::validation(format!(
                "unknown operation '{s}' (expected propagate[=N], solid[=COLOR], output=PATH or preview=PATH)"
            ))),
        }
    }
}

/// Result of one executed operation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpReport {
    /// Stats of a propagate run.
    Propagate(PropagateStats),
    /// Number of pixels a solid fill painted.
    SolidFill {
        /// Painted pixels.
        filled: usize,
    },
    /// A staged write.
    Write {
        /// Final target path.
        path: PathBuf,
        /// Whether alpha was forced opaque.
        preview: bool,
    },
}

/// Everything a successful [`Pipeline::run`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PipelineReport {
    /// One entry per operation, in execution order.
    pub ops: Vec<OpReport>,
}

impl PipelineReport {
    /// Files that now exist on disk, in write order.
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.ops.iter().filter_map(|op| match op {
            OpReport::Write { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }
}

/// An ordered operation list.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    ops: Vec<Operation>,
}

impl Pipeline {
    /// Pipeline running `ops` exactly as given.
    pub fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    /// Parse a JSON array of operations.
    pub fn from_json_str(json: &str) -> AlphaFillResult<Self> {
        let ops = serde_json::from_str(json).context("parse operation list JSON")?;
        Ok(Self { ops })
    }

    /// Read a JSON array of operations from a file.
    pub fn from_json_path(path: &Path) -> AlphaFillResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open operation list '{}'", path.display()))?;
        let ops = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse operation list '{}'", path.display()))?;
        Ok(Self { ops })
    }

    /// Operations in execution order.
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Fill in the implicit steps: an unbounded propagate when no fill is requested, and a
    /// write to `default_output` when no output is requested.
    pub fn with_defaults(mut self, default_output: &Path) -> Self {
        if !self.ops.iter().any(Operation::is_fill) {
            self.ops.insert(0, Operation::Propagate { max_rounds: None });
        }
        if !self
            .ops
            .iter()
            .any(|op| matches!(op, Operation::WriteOutput { .. }))
        {
            self.ops.push(Operation::WriteOutput {
                path: default_output.to_path_buf(),
            });
        }
        self
    }

    /// Apply every operation in order. Nothing is written unless all of them succeed.
    #[tracing::instrument(skip_all, fields(ops = self.ops.len()))]
    pub fn run(&self, processor: &mut Processor) -> AlphaFillResult<PipelineReport> {
        let writes = self.ops.iter().any(|op| {
            matches!(
                op,
                Operation::WriteOutput { .. } | Operation::WritePreview { .. }
            )
        });
        if writes && !processor.can_encode() {
            return Err(AlphaFillError::validation(format!(
                "cannot write channel layout {:?}; expected gray, gray+alpha, rgb or rgba order",
                processor.layout().roles()
            )));
        }

        let mut report = PipelineReport::default();
        let mut staged = Vec::new();

        for (index, op) in self.ops.iter().enumerate() {
            tracing::debug!(index, ?op, "operation");
            let entry = match op {
                Operation::Propagate { max_rounds } => {
                    OpReport::Propagate(processor.propagate(*max_rounds)?)
                }
                Operation::SolidFill { color } => OpReport::SolidFill {
                    filled: processor.solid_fill(*color)?,
                },
                Operation::WriteOutput { path } => {
                    staged.push(StagedWrite::stage(processor, path, false, index)?);
                    OpReport::Write {
                        path: path.clone(),
                        preview: false,
                    }
                }
                Operation::WritePreview { path } => {
                    staged.push(StagedWrite::stage(processor, path, true, index)?);
                    OpReport::Write {
                        path: path.clone(),
                        preview: true,
                    }
                }
            };
            report.ops.push(entry);
        }

        for write in &staged {
            write.check_target()?;
        }
        let mut committed: Vec<PathBuf> = Vec::new();
        for write in &mut staged {
            if let Err(err) = write.commit() {
                for path in committed {
                    let _ = std::fs::remove_file(path);
                }
                return Err(err);
            }
            committed.push(write.target.clone());
            tracing::info!(path = %write.target.display(), "wrote");
        }
        Ok(report)
    }
}

/// `in.png` -> `in.ImprovedTransparent.png`
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("ImprovedTransparent.png")
}

struct StagedWrite {
    guard: TempFileGuard,
    target: PathBuf,
}

impl StagedWrite {
    fn stage(
        processor: &Processor,
        target: &Path,
        preview: bool,
        index: usize,
    ) -> AlphaFillResult<Self> {
        let format = codec::format_for_path(target)?;
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }

        let file_name = target
            .file_name()
            .ok_or_else(|| {
                AlphaFillError::validation(format!(
                    "output path '{}' has no file name",
                    target.display()
                ))
            })?
            .to_string_lossy();
        let tmp = target.with_file_name(format!(".{file_name}.{index}.partial"));

        let guard = TempFileGuard(Some(tmp.clone()));
        processor.write_image_as(&tmp, format, preview)?;
        Ok(Self {
            guard,
            target: target.to_path_buf(),
        })
    }

    fn check_target(&self) -> AlphaFillResult<()> {
        if self.target.is_dir() {
            return Err(AlphaFillError::validation(format!(
                "output path '{}' is a directory",
                self.target.display()
            )));
        }
        let parent = match self.target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let meta = std::fs::metadata(parent)
            .with_context(|| format!("stat output dir '{}'", parent.display()))?;
        if meta.permissions().readonly() {
            return Err(AlphaFillError::validation(format!(
                "output dir '{}' is read-only",
                parent.display()
            )));
        }
        Ok(())
    }

    fn commit(&mut self) -> AlphaFillResult<()> {
        let Some(tmp) = self.guard.0.as_ref() else {
            return Ok(());
        };
        std::fs::rename(tmp, &self.target).with_context(|| {
            format!(
                "move '{}' to '{}'",
                tmp.display(),
                self.target.display()
            )
        })?;
        self.guard.0 = None;
        Ok(())
    }
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/ops.rs"]
mod tests;
