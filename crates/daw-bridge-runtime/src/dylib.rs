//! Control logic loaded from a shared library.
//!
//! # Library ABI
//!
//! Every symbol is optional; a missing one is an absent entry point.
//!
//! - `daw_bridge_startup(argv0: *const c_char) -> bool` - called once at load
//! - `daw_bridge_init() -> *mut c_void` - new plugin value, null on failure
//! - `daw_bridge_destroy(plugin: *mut c_void)`
//! - `daw_bridge_activate(plugin: *mut c_void, sample_rate: f64, max_frames: i64)`
//! - `daw_bridge_deactivate(plugin: *mut c_void)`
//! - `daw_bridge_process(plugin: *mut c_void)`
//!
//! The library owns the memory behind each pointer until `daw_bridge_destroy`.
//! Roots are tracked on this side only.
//!
//! The process path never waits on the live set: if the main thread holds it,
//! the tick is skipped with [`RuntimeError::Busy`].

use std::collections::HashMap;
use std::ffi::{c_char, c_void, CString};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use libloading::Library;
use parking_lot::Mutex;

use crate::entry_points::EntryPoint;
use crate::error::{Result, RuntimeError};
use crate::runtime::EmbeddedRuntime;
use crate::value::{Callable, HandleId, RootId, Value};

type StartupFn = unsafe extern "C" fn(argv0: *const c_char) -> bool;
type InitFn = unsafe extern "C" fn() -> *mut c_void;
type HandleFn = unsafe extern "C" fn(plugin: *mut c_void);
type ActivateFn = unsafe extern "C" fn(plugin: *mut c_void, sample_rate: f64, max_frames: i64);

#[derive(Clone, Copy)]
enum Export {
    Init(InitFn),
    Destroy(HandleFn),
    Activate(ActivateFn),
    Deactivate(HandleFn),
    Process(HandleFn),
}

pub struct DylibRuntime {
    name: String,
    exports: HashMap<EntryPoint, Export>,
    // Pointer -> liveness flag, cleared on destroy.
    live: Mutex<HashMap<HandleId, Arc<AtomicBool>>>,
    roots: Mutex<HashMap<RootId, HandleId>>,
    next_root: AtomicU64,
    // Keep the library loaded while the function pointers above exist.
    _library: Library,
}

impl DylibRuntime {
    /// Loads the library at `path`, resolves its exports, and runs its startup hook.
    pub fn load(path: &Path, argv0: &str) -> Result<Self> {
        // SAFETY: loading a library runs its initializers; the path comes from
        // the plugin's own configuration.
        let library = unsafe {
            Library::new(path).map_err(|e| RuntimeError::LibraryLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        let mut exports = HashMap::new();
        for entry_point in EntryPoint::ALL {
            if let Some(export) = unsafe { Self::resolve_export(&library, entry_point) } {
                exports.insert(entry_point, export);
            }
        }

        let startup = unsafe {
            library
                .get::<StartupFn>(b"daw_bridge_startup\0")
                .ok()
                .map(|s| *s)
        };
        if let Some(startup) = startup {
            let argv0_c = CString::new(argv0).map_err(|e| RuntimeError::Startup(e.to_string()))?;
            if !unsafe { startup(argv0_c.as_ptr()) } {
                return Err(RuntimeError::Startup(format!(
                    "daw_bridge_startup returned false in {}",
                    path.display()
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            entry_points = exports.len(),
            has_startup = startup.is_some(),
            "Runtime library loaded"
        );

        Ok(Self {
            name: argv0.to_string(),
            exports,
            live: Mutex::new(HashMap::new()),
            roots: Mutex::new(HashMap::new()),
            next_root: AtomicU64::new(0),
            _library: library,
        })
    }

    /// # Safety
    /// The symbol, if present, must have the signature documented for its entry point.
    unsafe fn resolve_export(library: &Library, entry_point: EntryPoint) -> Option<Export> {
        let mut symbol = entry_point.name().as_bytes().to_vec();
        symbol.push(0);

        let export = match entry_point {
            EntryPoint::Init => Export::Init(*library.get::<InitFn>(&symbol).ok()?),
            EntryPoint::Destroy => Export::Destroy(*library.get::<HandleFn>(&symbol).ok()?),
            EntryPoint::Activate => Export::Activate(*library.get::<ActivateFn>(&symbol).ok()?),
            EntryPoint::Deactivate => Export::Deactivate(*library.get::<HandleFn>(&symbol).ok()?),
            EntryPoint::Process => Export::Process(*library.get::<HandleFn>(&symbol).ok()?),
        };
        Some(export)
    }

    fn export(&self, callable: Callable) -> Result<(EntryPoint, Export)> {
        let entry_point = EntryPoint::ALL
            .get(callable.index())
            .copied()
            .ok_or(RuntimeError::UnknownCallable(callable))?;
        let export = self
            .exports
            .get(&entry_point)
            .copied()
            .ok_or(RuntimeError::UnknownCallable(callable))?;
        Ok((entry_point, export))
    }

    fn handle_arg(entry_point: EntryPoint, value: Option<&Value>) -> Result<HandleId> {
        value.and_then(Value::as_handle).ok_or_else(|| {
            RuntimeError::bad_arguments(entry_point.name(), "first argument must be a handle")
        })
    }

    /// Main-thread liveness check; waits for the live set.
    fn live_pointer(&self, entry_point: EntryPoint, value: Option<&Value>) -> Result<*mut c_void> {
        let id = Self::handle_arg(entry_point, value)?;
        if !self.live.lock().contains_key(&id) {
            return Err(RuntimeError::DeadHandle(id));
        }
        Ok(pointer(id))
    }

    /// Audio-thread liveness check; never waits.
    fn try_live_pointer(
        &self,
        entry_point: EntryPoint,
        value: Option<&Value>,
    ) -> Result<*mut c_void> {
        let id = Self::handle_arg(entry_point, value)?;
        let live = self
            .live
            .try_lock()
            .ok_or(RuntimeError::Busy(entry_point))?;
        if !live.contains_key(&id) {
            return Err(RuntimeError::DeadHandle(id));
        }
        Ok(pointer(id))
    }
}

fn pointer(id: HandleId) -> *mut c_void {
    id.0 as usize as *mut c_void
}

impl EmbeddedRuntime for DylibRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn named_value(&self, name: &str) -> Option<Callable> {
        let entry_point = EntryPoint::from_name(name)?;
        if !self.exports.contains_key(&entry_point) {
            return None;
        }
        let index = EntryPoint::ALL.iter().position(|ep| *ep == entry_point)?;
        Some(Callable::new(index as u32))
    }

    fn call(&self, callable: Callable, args: &[Value]) -> Result<Value> {
        let (entry_point, export) = self.export(callable)?;
        match export {
            Export::Init(init) => {
                if args.iter().any(|arg| !arg.is_unit()) {
                    return Err(RuntimeError::bad_arguments(
                        entry_point.name(),
                        "takes no arguments",
                    ));
                }
                let plugin = unsafe { init() };
                if plugin.is_null() {
                    return Ok(Value::Unit);
                }
                let id = HandleId(plugin as usize as u64);
                self.live.lock().insert(id, Arc::new(AtomicBool::new(true)));
                Ok(Value::Handle(id))
            }
            Export::Destroy(destroy) => {
                let id = Self::handle_arg(entry_point, args.first())?;
                let flag = self
                    .live
                    .lock()
                    .remove(&id)
                    .ok_or(RuntimeError::DeadHandle(id))?;
                flag.store(false, Ordering::Release);
                unsafe { destroy(pointer(id)) };
                Ok(Value::Unit)
            }
            Export::Activate(activate) => {
                let (sample_rate, max_frames) = match args {
                    [_, Value::Float(sample_rate), Value::Int(max_frames)] => {
                        (*sample_rate, *max_frames)
                    }
                    _ => {
                        return Err(RuntimeError::bad_arguments(
                            entry_point.name(),
                            "expected (handle, float, int)",
                        ))
                    }
                };
                let plugin = self.live_pointer(entry_point, args.first())?;
                unsafe { activate(plugin, sample_rate, max_frames) };
                Ok(Value::Unit)
            }
            Export::Deactivate(deactivate) => {
                let plugin = self.live_pointer(entry_point, args.first())?;
                unsafe { deactivate(plugin) };
                Ok(Value::Unit)
            }
            Export::Process(process) => {
                let plugin = self.try_live_pointer(entry_point, args.first())?;
                unsafe { process(plugin) };
                Ok(Value::Unit)
            }
        }
    }

    // Library objects only die through `daw_bridge_destroy`, so nothing can
    // free the result between the call and the root.
    fn call_rooted(&self, callable: Callable, args: &[Value]) -> Result<(Value, Option<RootId>)> {
        let value = self.call(callable, args)?;
        let root = match value.as_handle() {
            Some(_) => Some(self.register_root(&value)?),
            None => None,
        };
        Ok((value, root))
    }

    fn register_root(&self, value: &Value) -> Result<RootId> {
        let id = value.as_handle().ok_or_else(|| {
            RuntimeError::bad_arguments("register_root", format!("cannot root a {}", value.kind()))
        })?;
        if !self.live.lock().contains_key(&id) {
            return Err(RuntimeError::DeadHandle(id));
        }
        let root = RootId(self.next_root.fetch_add(1, Ordering::Relaxed) + 1);
        self.roots.lock().insert(root, id);
        Ok(root)
    }

    fn remove_root(&self, root: RootId) -> bool {
        self.roots.lock().remove(&root).is_some()
    }

    fn is_live(&self, value: &Value) -> bool {
        value
            .as_handle()
            .is_some_and(|id| self.live.lock().contains_key(&id))
    }

    fn liveness(&self, value: &Value) -> Option<Arc<AtomicBool>> {
        let id = value.as_handle()?;
        self.live.lock().get(&id).cloned()
    }

    fn root_count(&self) -> usize {
        self.roots.lock().len()
    }
}
