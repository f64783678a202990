//! Generation driver.
//!
//! Owns the handlebars registry, the generation epoch and the shared pass
//! state. One pass: bump the epoch, reset anonymous-type names, render the
//! script through a forwarding writer, commit the still-open slot, sweep
//! stale outputs. Helpers mutate the shared state; they run synchronously
//! inside the render, so the mutex is never contended across passes.

use crate::error::{Error, Result};
use crate::model::{json as model_json, AnonNames};
use crate::output::OutputLedger;
use crate::solution::Solution;
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, ScopedJson,
};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

const MAIN_TEMPLATE: &str = "main";

/// State shared between the driver and its helpers.
pub struct DriverState {
    /// Directory of the script; source manifests, cleaned paths and output
    /// destinations resolve against it.
    root: PathBuf,
    epoch: u64,
    verbose: bool,
    cleaned: bool,
    solution: Option<Solution>,
    ledger: OutputLedger,
    anon: AnonNames,
}

impl DriverState {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn solution_mut(&mut self) -> Option<&mut Solution> {
        self.solution.as_mut()
    }

    pub fn ledger(&self) -> &OutputLedger {
        &self.ledger
    }
}

pub type SharedState = Arc<Mutex<DriverState>>;

/// The generation driver: a compiled script plus the state its helpers
/// share with the pass loop.
pub struct Driver {
    registry: Handlebars<'static>,
    state: SharedState,
}

impl Driver {
    /// Compiles the script and registers the template actions. Fails on a
    /// missing script or a template syntax error.
    pub fn new(script: &Path, verbose: bool) -> Result<Self> {
        let text = fs::read_to_string(script).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::ScriptNotFound(script.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let root = script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let state: SharedState = Arc::new(Mutex::new(DriverState {
            root,
            epoch: 0,
            verbose,
            cleaned: false,
            solution: None,
            ledger: OutputLedger::new(),
            anon: AnonNames::new(),
        }));

        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_template_string(MAIN_TEMPLATE, text)?;
        registry.register_helper("declare_source", Box::new(DeclareSource(state.clone())));
        registry.register_helper("clean", Box::new(Clean(state.clone())));
        registry.register_helper("open_output", Box::new(OpenOutput(state.clone())));
        registry.register_helper("log", Box::new(Log));
        registry.register_helper("code", Box::new(Code(state.clone())));

        Ok(Self { registry, state })
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Runs one generation pass. The close and sweep phases run even when
    /// rendering fails, so a failed pass cannot leave an open slot behind
    /// or resurrect stale outputs on the next one.
    pub fn run_pass(&self) -> Result<()> {
        let epoch = {
            let mut state = self.state.lock();
            state.epoch += 1;
            state.anon.reset();
            state.epoch
        };
        debug!(epoch, "starting generation pass");
        let started = Instant::now();

        let mut writer = ForwardWriter::new(self.state.clone());
        let rendered = self
            .registry
            .render_to_write(MAIN_TEMPLATE, &serde_json::Value::Null, &mut writer);

        let finish = {
            let mut state = self.state.lock();
            state.ledger.close(epoch).and_then(|_| state.ledger.sweep(epoch))
        };

        if let Err(render) = rendered {
            // The render error is the one worth propagating, but a close
            // or sweep failure alongside it must not vanish.
            if let Err(e) = finish {
                error!(error = %e, "output commit failed after a render error");
            }
            return Err(render.into());
        }
        finish?;
        info!(epoch, elapsed = ?started.elapsed(), "generated");
        Ok(())
    }
}

/// Forwards rendered chunks into the ledger's open slot. Text rendered
/// before the script opens a destination is dropped. Chunks that split a
/// UTF-8 sequence are held back until the sequence completes.
struct ForwardWriter {
    state: SharedState,
    pending: Vec<u8>,
}

impl ForwardWriter {
    fn new(state: SharedState) -> Self {
        Self {
            state,
            pending: Vec::new(),
        }
    }
}

impl io::Write for ForwardWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            Err(e) => e.valid_up_to(),
        };
        if valid > 0 {
            let text = std::str::from_utf8(&self.pending[..valid]).unwrap_or_default();
            self.state.lock().ledger.write(text);
            self.pending.drain(..valid);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn str_param<'a>(
    h: &'a Helper<'_>,
    index: usize,
    helper: &str,
) -> std::result::Result<&'a str, RenderError> {
    h.param(index)
        .and_then(|p| p.value().as_str())
        .ok_or_else(|| {
            RenderErrorReason::Other(format!(
                "{helper}: missing string argument #{index}"
            ))
            .into()
        })
}

fn helper_error(message: String) -> RenderError {
    RenderErrorReason::Other(message).into()
}

/// `{{declare_source "solution.json" "ProjectGlob"}}`: loads the solution
/// on the first pass, resynchronizes the compilations on every later one.
struct DeclareSource(SharedState);

impl HelperDef for DeclareSource {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        _out: &mut dyn Output,
    ) -> HelperResult {
        let manifest = str_param(h, 0, "declare_source")?;
        let filter = h.param(1).and_then(|p| p.value().as_str());

        let mut state = self.0.lock();
        if state.solution.is_none() {
            let path = state.root.join(manifest);
            let solution = Solution::load(&path, filter, state.verbose)
                .map_err(|e| helper_error(format!("declare_source: {e}")))?;
            state.solution = Some(solution);
        } else if let Some(solution) = state.solution.as_mut() {
            solution.rebuild_all();
        }
        Ok(())
    }
}

/// `{{clean "Generated/**/*.cs"}}`: deletes matching files under the
/// script root. First pass only; later passes are no-ops.
struct Clean(SharedState);

impl HelperDef for Clean {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        _out: &mut dyn Output,
    ) -> HelperResult {
        let patterns = str_param(h, 0, "clean")?;
        let mut state = self.0.lock();
        if state.cleaned {
            return Ok(());
        }
        state.cleaned = true;

        for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let rooted = state.root.join(pattern);
            let rooted = rooted.to_string_lossy();
            let matches = glob::glob(&rooted)
                .map_err(|e| helper_error(format!("clean: bad pattern `{pattern}`: {e}")))?;
            for entry in matches {
                let path = entry.map_err(|e| helper_error(format!("clean: {e}")))?;
                if path.is_file() {
                    fs::remove_file(&path)
                        .map_err(|e| helper_error(format!("clean: {}: {e}", path.display())))?;
                    info!(path = %path.display(), "cleaned");
                }
            }
        }
        Ok(())
    }
}

/// `{{open_output "Generated/Api" "Client.ts"}}`: closes the current
/// destination and directs subsequent output to a new one.
struct OpenOutput(SharedState);

impl HelperDef for OpenOutput {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        _out: &mut dyn Output,
    ) -> HelperResult {
        let directory = str_param(h, 0, "open_output")?;
        let filename = str_param(h, 1, "open_output")?;

        let mut state = self.0.lock();
        let path = state.root.join(directory).join(filename);
        let epoch = state.epoch;
        state
            .ledger
            .open(path, epoch)
            .map_err(|e| helper_error(format!("open_output: {e}")))?;
        Ok(())
    }
}

/// `{{log "message"}}`: surfaces script-side diagnostics in the process
/// log.
struct Log;

impl HelperDef for Log {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        _out: &mut dyn Output,
    ) -> HelperResult {
        let message = h
            .param(0)
            .map(|p| match p.value() {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        info!(target: "script", "{message}");
        Ok(())
    }
}

/// `{{code}}`: the rooted code model, recomputed at every reference so it
/// reflects the current pass's compilations.
struct Code(SharedState);

impl HelperDef for Code {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        _h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
    ) -> std::result::Result<ScopedJson<'rc>, RenderError> {
        let mut guard = self.0.lock();
        let state = &mut *guard;
        let solution = state.solution.as_ref().ok_or_else(|| {
            helper_error("code: no solution declared, call declare_source first".to_string())
        })?;
        let value = model_json::code_json(solution, &mut state.anon);
        Ok(ScopedJson::Derived(value))
    }
}
