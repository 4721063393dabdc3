//! In-process managed runtime.
//!
//! Control logic written in Rust runs here. It registers native functions under
//! the `daw_bridge_*` names and keeps its per-instance state in the runtime
//! heap. The heap is garbage collected: [`ManagedRuntime::collect`] frees every
//! object that no root refers to, so the bridge must pin what it holds.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, RuntimeError};
use crate::runtime::EmbeddedRuntime;
use crate::value::{Callable, HandleId, RootId, Value};

/// A native function callable from the bridge.
///
/// Runs with the runtime locked; it gets the heap directly and must not call
/// back into the [`ManagedRuntime`].
pub type NativeFn = Arc<dyn Fn(&mut Heap, &[Value]) -> Result<Value> + Send + Sync>;

/// Registers control logic during [`ManagedRuntime::startup`].
pub type Program = fn(&ManagedRuntime);

/// Object storage of the managed runtime.
#[derive(Default)]
pub struct Heap {
    objects: HashMap<HandleId, Box<dyn Any + Send>>,
    next_id: u64,
}

impl Heap {
    /// Moves `object` into the heap and returns a handle to it.
    pub fn alloc<T: Any + Send>(&mut self, object: T) -> Value {
        self.next_id += 1;
        let id = HandleId(self.next_id);
        self.objects.insert(id, Box::new(object));
        Value::Handle(id)
    }

    pub fn get<T: Any>(&self, value: &Value) -> Option<&T> {
        let id = value.as_handle()?;
        self.objects.get(&id)?.downcast_ref::<T>()
    }

    pub fn get_mut<T: Any>(&mut self, value: &Value) -> Option<&mut T> {
        let id = value.as_handle()?;
        self.objects.get_mut(&id)?.downcast_mut::<T>()
    }

    /// Frees the object `value` refers to. Returns `false` if there was none.
    pub fn free(&mut self, value: &Value) -> bool {
        value
            .as_handle()
            .is_some_and(|id| self.objects.remove(&id).is_some())
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[derive(Default)]
struct ManagedState {
    heap: Heap,
    roots: HashMap<RootId, HandleId>,
    next_root: u64,
    functions: Vec<NativeFn>,
    names: HashMap<String, Callable>,
    calls_since_collect: u32,
}

impl ManagedState {
    fn call(
        &mut self,
        callable: Callable,
        args: &[Value],
        collection_interval: Option<NonZeroU32>,
    ) -> Result<Value> {
        let function = self
            .functions
            .get(callable.index())
            .cloned()
            .ok_or(RuntimeError::UnknownCallable(callable))?;

        if let Some(interval) = collection_interval {
            self.calls_since_collect += 1;
            if self.calls_since_collect >= interval.get() {
                self.calls_since_collect = 0;
                self.collect();
            }
        }

        function(&mut self.heap, args)
    }

    fn root(&mut self, id: HandleId) -> RootId {
        self.next_root += 1;
        let root = RootId(self.next_root);
        self.roots.insert(root, id);
        root
    }

    fn collect(&mut self) -> usize {
        let rooted: HashSet<HandleId> = self.roots.values().copied().collect();
        let before = self.heap.len();
        self.heap.objects.retain(|id, _| rooted.contains(id));
        before - self.heap.len()
    }
}

pub struct ManagedRuntime {
    name: String,
    state: Mutex<ManagedState>,
    collection_interval: Option<NonZeroU32>,
    lookups: AtomicUsize,
}

impl ManagedRuntime {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ManagedState::default()),
            collection_interval: None,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Collect automatically before every `calls`-th call. `0` disables it.
    pub fn with_collection_interval(mut self, calls: u32) -> Self {
        self.collection_interval = NonZeroU32::new(calls);
        self
    }

    /// Boots the runtime and runs each program once, in order.
    pub fn startup(argv0: &str, programs: &[Program]) -> Self {
        let runtime = Self::new(argv0);
        for program in programs {
            program(&runtime);
        }
        tracing::info!(
            runtime = argv0,
            programs = programs.len(),
            entry_points = runtime.state.lock().names.len(),
            "Managed runtime started"
        );
        runtime
    }

    /// Registers `function` under `name`, replacing any earlier registration.
    ///
    /// A replaced name keeps its [`Callable`], so cached lookups stay valid.
    pub fn register<F>(&self, name: &str, function: F)
    where
        F: Fn(&mut Heap, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        let function: NativeFn = Arc::new(function);
        match state.names.get(name).copied() {
            Some(callable) => state.functions[callable.index()] = function,
            None => {
                let callable = Callable::new(state.functions.len() as u32);
                state.functions.push(function);
                state.names.insert(name.to_string(), callable);
            }
        }
        tracing::trace!(name, "Registered native function");
    }

    /// Frees every heap object not reachable from a root. Returns how many were freed.
    pub fn collect(&self) -> usize {
        let freed = self.state.lock().collect();
        if freed > 0 {
            tracing::trace!(freed, "Collected unrooted objects");
        }
        freed
    }

    /// Number of objects on the heap.
    pub fn heap_len(&self) -> usize {
        self.state.lock().heap.len()
    }

    /// Read access to the heap, e.g. to inspect control-logic state.
    pub fn with_heap<R>(&self, f: impl FnOnce(&Heap) -> R) -> R {
        f(&self.state.lock().heap)
    }

    /// Number of `named_value` lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl EmbeddedRuntime for ManagedRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn named_value(&self, name: &str) -> Option<Callable> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.state.lock().names.get(name).copied()
    }

    fn call(&self, callable: Callable, args: &[Value]) -> Result<Value> {
        self.state.lock().call(callable, args, self.collection_interval)
    }

    fn call_rooted(&self, callable: Callable, args: &[Value]) -> Result<(Value, Option<RootId>)> {
        let mut state = self.state.lock();
        let value = state.call(callable, args, self.collection_interval)?;
        let root = match value.as_handle() {
            Some(id) if state.heap.contains(id) => Some(state.root(id)),
            _ => None,
        };
        Ok((value, root))
    }

    fn register_root(&self, value: &Value) -> Result<RootId> {
        let id = value.as_handle().ok_or_else(|| {
            RuntimeError::bad_arguments("register_root", format!("cannot root a {}", value.kind()))
        })?;

        let mut state = self.state.lock();
        if !state.heap.contains(id) {
            return Err(RuntimeError::DeadHandle(id));
        }
        Ok(state.root(id))
    }

    fn remove_root(&self, root: RootId) -> bool {
        self.state.lock().roots.remove(&root).is_some()
    }

    fn is_live(&self, value: &Value) -> bool {
        value
            .as_handle()
            .is_some_and(|id| self.state.lock().heap.contains(id))
    }

    fn root_count(&self) -> usize {
        self.state.lock().roots.len()
    }
}
