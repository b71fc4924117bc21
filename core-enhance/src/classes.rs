//! Named object classes with generated accessors

use crate::error::{EnhanceError, Result};
use bridge_traits::SdkObject;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// An instance method. Getters resolve with `Some(value)`; setters mutate
/// the object and resolve with `None`.
pub type ClassMethod = Arc<dyn Fn(&mut SdkObject, Vec<Value>) -> Option<Value> + Send + Sync>;

/// A class definition: its name, the attributes that get accessors, and any
/// custom instance methods.
#[derive(Clone, Default)]
pub struct ClassSpec {
    pub class_name: String,
    pub attrs: Vec<String>,
    pub methods: HashMap<String, ClassMethod>,
}

impl ClassSpec {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(name.into());
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut SdkObject, Vec<Value>) -> Option<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }
}

impl fmt::Debug for ClassSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("ClassSpec")
            .field("class_name", &self.class_name)
            .field("attrs", &self.attrs)
            .field("methods", &methods)
            .finish()
    }
}

/// What [`ClassRegistry::extend`] accepts.
#[derive(Debug, Clone)]
pub enum ClassDescriptor {
    /// A class with no attributes or methods of its own.
    Name(String),
    Spec(ClassSpec),
}

impl ClassDescriptor {
    fn class_name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Spec(spec) => &spec.class_name,
        }
    }
}

impl From<&str> for ClassDescriptor {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ClassDescriptor {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<ClassSpec> for ClassDescriptor {
    fn from(spec: ClassSpec) -> Self {
        Self::Spec(spec)
    }
}

/// A registered class.
pub struct ObjectClass {
    class_name: String,
    methods: BTreeMap<String, ClassMethod>,
}

impl ObjectClass {
    fn from_descriptor(descriptor: ClassDescriptor) -> Self {
        let spec = match descriptor {
            ClassDescriptor::Name(name) => ClassSpec::new(name),
            ClassDescriptor::Spec(spec) => spec,
        };

        let mut methods: BTreeMap<String, ClassMethod> = spec.methods.into_iter().collect();
        for attr in spec.attrs {
            let field = capitalize_first(&attr);

            let key = attr.clone();
            let getter: ClassMethod = Arc::new(move |object: &mut SdkObject, _args: Vec<Value>| {
                object.get(&key).cloned()
            });
            methods.entry(format!("get{field}")).or_insert(getter);

            let key = attr;
            let setter: ClassMethod = Arc::new(move |object: &mut SdkObject, args: Vec<Value>| {
                let value = args.into_iter().next().unwrap_or(Value::Null);
                object.set(key.clone(), value);
                None
            });
            methods.entry(format!("set{field}")).or_insert(setter);
        }

        Self {
            class_name: spec.class_name,
            methods,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// A new, unsaved object of this class.
    pub fn create(&self) -> SdkObject {
        SdkObject::new(self.class_name.clone())
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Method names, sorted.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Invoke an instance method on `object`.
    ///
    /// # Errors
    ///
    /// [`EnhanceError::WrongClass`] when `object` belongs to another class,
    /// [`EnhanceError::UnknownMethod`] when the class has no such method.
    pub fn call(
        &self,
        object: &mut SdkObject,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Option<Value>> {
        if object.class_name != self.class_name {
            return Err(EnhanceError::WrongClass {
                method: method.to_string(),
                expected: self.class_name.clone(),
                actual: object.class_name.clone(),
            });
        }
        let handler = self
            .methods
            .get(method)
            .ok_or_else(|| EnhanceError::UnknownMethod {
                class: self.class_name.clone(),
                method: method.to_string(),
            })?;
        Ok(handler(object, args))
    }
}

impl fmt::Debug for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectClass")
            .field("class_name", &self.class_name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Classes by name. Extending a name again replaces the earlier class.
#[derive(Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, Arc<ObjectClass>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a class and remember it under its name.
    pub fn extend(&self, descriptor: impl Into<ClassDescriptor>) -> Result<Arc<ObjectClass>> {
        let descriptor = descriptor.into();
        if descriptor.class_name().is_empty() {
            return Err(EnhanceError::EmptyClassName);
        }

        let class = Arc::new(ObjectClass::from_descriptor(descriptor));
        debug!(
            class = class.class_name(),
            methods = class.methods.len(),
            "Registered object class"
        );
        self.classes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(class.class_name.clone(), Arc::clone(&class));
        Ok(class)
    }

    pub fn get_class(&self, class_name: &str) -> Option<Arc<ObjectClass>> {
        self.classes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(class_name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes = self.classes.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<_> = classes.keys().collect();
        names.sort();
        f.debug_struct("ClassRegistry").field("classes", &names).finish()
    }
}

fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
