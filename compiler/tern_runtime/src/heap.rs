//! The runtime heap and its call-site objects.

use parking_lot::RwLock;
use tern_ir::{
    CallSiteBinding, CallSiteKind, Constant, ConstantReflection, MetaAccess, MethodRef,
    ObjectRef, ReflectionError, TypeRef,
};

/// Well-known runtime classes.
pub mod classes {
    use tern_ir::{CallSiteKind, TypeRef};

    pub const OBJECT: TypeRef = TypeRef::new(0);
    pub const METHOD_HANDLE: TypeRef = TypeRef::new(1);
    /// Abstract base of all call-site classes. Only ever a declared type.
    pub const CALL_SITE: TypeRef = TypeRef::new(2);
    pub const MUTABLE_CALL_SITE: TypeRef = TypeRef::new(3);
    pub const VOLATILE_CALL_SITE: TypeRef = TypeRef::new(4);
    pub const CONSTANT_CALL_SITE: TypeRef = TypeRef::new(5);

    /// The concrete class of a call site of the given flavor.
    pub fn call_site_class(kind: CallSiteKind) -> TypeRef {
        match kind {
            CallSiteKind::Mutable => MUTABLE_CALL_SITE,
            CallSiteKind::Volatile => VOLATILE_CALL_SITE,
            CallSiteKind::Constant => CONSTANT_CALL_SITE,
        }
    }
}

/// Failure of a runtime operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Reflection(#[from] ReflectionError),
    #[error("{0:?} is a constant call site that is already linked")]
    ImmutableCallSite(ObjectRef),
    #[error("{0:?} is not a method handle")]
    NotAMethodHandle(ObjectRef),
    #[error("null receiver for {method}")]
    NullReceiver { method: &'static str },
    #[error("receiver of {method} is not an object: {found}")]
    NotAnObject {
        method: &'static str,
        found: Constant,
    },
    #[error("{method} expects {expected} argument(s), got {got}")]
    Arity {
        method: &'static str,
        expected: usize,
        got: usize,
    },
}

#[derive(Clone, Debug)]
enum HeapObject {
    Plain,
    MethodHandle {
        name: String,
    },
    CallSite {
        kind: CallSiteKind,
        target: Option<ObjectRef>,
    },
}

/// The runtime heap.
///
/// Objects are never freed; an [`ObjectRef`] stays valid for the life of
/// the runtime.
#[derive(Debug, Default)]
pub struct Runtime {
    heap: RwLock<Vec<HeapObject>>,
}

impl Runtime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&self, object: HeapObject) -> ObjectRef {
        let mut heap = self.heap.write();
        let id = ObjectRef::new(
            u32::try_from(heap.len()).unwrap_or_else(|_| panic!("heap exceeds u32::MAX objects")),
        );
        heap.push(object);
        id
    }

    /// Allocate an object with no runtime behavior.
    pub fn alloc_object(&self) -> ObjectRef {
        self.alloc(HeapObject::Plain)
    }

    /// Allocate a method handle. `name` is for diagnostics only.
    pub fn alloc_method_handle(&self, name: impl Into<String>) -> ObjectRef {
        self.alloc(HeapObject::MethodHandle { name: name.into() })
    }

    /// Allocate a call site, optionally already linked to `target`.
    pub fn alloc_call_site(
        &self,
        kind: CallSiteKind,
        target: Option<ObjectRef>,
    ) -> Result<ObjectRef, RuntimeError> {
        if let Some(target) = target {
            self.check_method_handle(target)?;
        }
        Ok(self.alloc(HeapObject::CallSite { kind, target }))
    }

    /// Bind `call_site` to `target`.
    ///
    /// Mutable and volatile call sites may be re-bound any number of times.
    /// A constant call site can only be linked once.
    pub fn set_target(&self, call_site: ObjectRef, target: ObjectRef) -> Result<(), RuntimeError> {
        let name = self.check_method_handle(target)?;
        let mut heap = self.heap.write();
        match heap.get_mut(call_site.index()) {
            None => Err(ReflectionError::Dangling(call_site).into()),
            Some(HeapObject::CallSite {
                kind: CallSiteKind::Constant,
                target: Some(_),
            }) => Err(RuntimeError::ImmutableCallSite(call_site)),
            Some(HeapObject::CallSite { target: slot, .. }) => {
                tracing::debug!(?call_site, ?target, %name, "call site re-bound");
                *slot = Some(target);
                Ok(())
            }
            Some(_) => Err(ReflectionError::NotACallSite(call_site).into()),
        }
    }

    /// Current target of `call_site`, `None` if not linked yet.
    pub fn target_of(&self, call_site: ObjectRef) -> Result<Option<ObjectRef>, RuntimeError> {
        Ok(self.call_site_binding(call_site)?.target)
    }

    /// Execute `method` with `args` (receiver first).
    pub fn invoke(&self, method: MethodRef, args: &[Constant]) -> Result<Constant, RuntimeError> {
        match method {
            MethodRef::CallSiteGetTarget => {
                let name = method.name();
                let [receiver] = args else {
                    return Err(RuntimeError::Arity {
                        method: name,
                        expected: 1,
                        got: args.len(),
                    });
                };
                match *receiver {
                    Constant::Null => Err(RuntimeError::NullReceiver { method: name }),
                    Constant::Int(_) => Err(RuntimeError::NotAnObject {
                        method: name,
                        found: *receiver,
                    }),
                    Constant::Object(call_site) => {
                        Ok(Constant::from_object(self.target_of(call_site)?))
                    }
                }
            }
        }
    }

    /// The diagnostic name of `object` if it is a method handle.
    fn check_method_handle(&self, object: ObjectRef) -> Result<String, RuntimeError> {
        match self.heap.read().get(object.index()) {
            Some(HeapObject::MethodHandle { name }) => Ok(name.clone()),
            Some(_) => Err(RuntimeError::NotAMethodHandle(object)),
            None => Err(ReflectionError::Dangling(object).into()),
        }
    }
}

impl MetaAccess for Runtime {
    fn type_of(&self, object: ObjectRef) -> Option<TypeRef> {
        self.heap.read().get(object.index()).map(|obj| match obj {
            HeapObject::Plain => classes::OBJECT,
            HeapObject::MethodHandle { .. } => classes::METHOD_HANDLE,
            HeapObject::CallSite { kind, .. } => classes::call_site_class(*kind),
        })
    }
}

impl ConstantReflection for Runtime {
    fn call_site_binding(&self, object: ObjectRef) -> Result<CallSiteBinding, ReflectionError> {
        match self.heap.read().get(object.index()) {
            Some(HeapObject::CallSite { kind, target }) => Ok(CallSiteBinding {
                kind: *kind,
                target: *target,
            }),
            Some(_) => Err(ReflectionError::NotACallSite(object)),
            None => Err(ReflectionError::Dangling(object)),
        }
    }
}
