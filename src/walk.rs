//! Recursive struct walker.
//!
//! A struct's [`EnvStruct::bind`] hands every field to the [`Walker`], which
//! decides per field whether to descend (non-nil struct pointers, nested
//! structs, embedded structs, struct slices) or to run the leaf
//! [`FieldAction`]. The action is pluggable: [`SetField`] resolves and
//! assigns values, [`CollectParams`] only records field parameters.
//!
//! Errors of sibling fields, nested structs and slice elements are
//! collected and joined; structural errors (bad tags, non-struct targets)
//! abort the walk.

use std::any::type_name;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::env::Environment;
use crate::error::EnvError;
use crate::options::Options;
use crate::resolve::{BindState, resolve_value};
use crate::slice;
use crate::tags::{FieldDecl, FieldParams, Tags};
use crate::value::{Bindable, EnvStruct, ParseCx, Slot};

/// Leaf behaviour run for every non-ignored field.
pub trait FieldAction {
    fn process(
        &mut self,
        slot: &mut dyn Slot,
        field: &FieldDecl,
        opts: &Options,
        params: &FieldParams,
        state: &mut BindState,
    ) -> Result<(), EnvError>;
}

/// Resolve the field's value and assign it. Empty values leave the field
/// untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetField;

impl FieldAction for SetField {
    fn process(
        &mut self,
        slot: &mut dyn Slot,
        field: &FieldDecl,
        opts: &Options,
        params: &FieldParams,
        state: &mut BindState,
    ) -> Result<(), EnvError> {
        let value = resolve_value(params, opts, state)?;
        if value.is_empty() {
            return Ok(());
        }
        slot.assign(&value, &ParseCx::new(field, opts))
    }
}

/// Record the parameters of every field with a key. Nothing is resolved.
#[derive(Debug, Default, Clone)]
pub struct CollectParams {
    params: Vec<FieldParams>,
}

impl CollectParams {
    pub fn into_params(self) -> Vec<FieldParams> {
        self.params
    }
}

impl FieldAction for CollectParams {
    fn process(
        &mut self,
        _slot: &mut dyn Slot,
        _field: &FieldDecl,
        _opts: &Options,
        params: &FieldParams,
        _state: &mut BindState,
    ) -> Result<(), EnvError> {
        if !params.own_key.is_empty() {
            self.params.push(params.clone());
        }
        Ok(())
    }
}

/// Field registrar passed to [`EnvStruct::bind`].
pub struct Walker<'a> {
    opts: &'a Options,
    state: &'a mut BindState,
    action: &'a mut dyn FieldAction,
    errors: Vec<EnvError>,
}

impl Walker<'_> {
    /// Bind one field.
    ///
    /// Non-structural failures are recorded and `Ok` is returned so the
    /// remaining fields still get bound; the collected errors surface when
    /// the walk of the enclosing struct completes.
    pub fn field<T: Bindable>(
        &mut self,
        name: &'static str,
        tags: Tags,
        slot: &mut T,
    ) -> Result<(), EnvError> {
        let decl = FieldDecl {
            name,
            tags,
            type_name: type_name::<T>(),
        };
        let outcome = self.bind_field(&decl, slot);
        self.collect(outcome)
    }

    /// Bind an embedded struct in place. Its fields behave as if declared
    /// on the enclosing struct, under the embed's prefix tag if any.
    pub fn embed<S: EnvStruct>(&mut self, tags: Tags, inner: &mut S) -> Result<(), EnvError> {
        let decl = FieldDecl {
            name: type_name::<S>(),
            tags,
            type_name: type_name::<S>(),
        };
        let opts = self.opts.nested(&decl);
        let outcome = self.descend(inner, &opts);
        self.collect(outcome)
    }

    /// Prefix applied to keys at this level.
    pub fn prefix(&self) -> &str {
        &self.opts.prefix
    }

    fn bind_field<T: Bindable>(&mut self, decl: &FieldDecl, slot: &mut T) -> Result<(), EnvError> {
        if let Some(pointee) = slot.pointee() {
            let opts = self.opts.nested(decl);
            return self.descend(pointee, &opts);
        }

        let params = FieldParams::resolve(decl, self.opts)?;
        if params.ignored {
            trace!(field = decl.name, "ignored");
            return Ok(());
        }

        self.action
            .process(slot, decl, self.opts, &params, self.state)?;

        let opts = self.opts;
        if params.init
            && let Some(pointee) = slot.init_pointer(&opts.parsers)
        {
            debug!(field = decl.name, "initialised nil pointer");
            return self.descend(pointee, &opts.nested(decl));
        }

        if let Some(inner) = slot.as_struct() {
            return self.descend(inner, &opts.nested(decl));
        }

        if T::is_struct_slice(&opts.parsers) {
            return slice::bind_slice(slot, &opts.nested(decl), self.state, self.action);
        }

        Ok(())
    }

    fn descend(&mut self, target: &mut dyn EnvStruct, opts: &Options) -> Result<(), EnvError> {
        trace!(prefix = %opts.prefix, "descending");
        walk(target, opts, self.state, self.action)
    }

    fn collect(&mut self, outcome: Result<(), EnvError>) -> Result<(), EnvError> {
        match outcome {
            Err(err) if err.is_structural() => Err(err),
            Err(err) => {
                self.errors.push(err);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}

/// Walk one struct level and join whatever its fields reported.
pub(crate) fn walk(
    target: &mut dyn EnvStruct,
    opts: &Options,
    state: &mut BindState,
    action: &mut dyn FieldAction,
) -> Result<(), EnvError> {
    let mut walker = Walker {
        opts,
        state,
        action,
        errors: Vec::new(),
    };
    target.bind(&mut walker)?;
    match EnvError::join(walker.errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Top-level bind: snapshot the environment if none was given, walk, then
/// apply scheduled unsets whatever the outcome.
pub(crate) fn bind<T: Bindable>(
    target: &mut T,
    opts: Options,
    action: &mut dyn FieldAction,
) -> Result<(), EnvError> {
    let Some(root) = target.as_struct() else {
        return Err(EnvError::NotAStructPointer {
            type_name: type_name::<T>(),
        });
    };

    let env = opts
        .environment
        .clone()
        .unwrap_or_else(|| Arc::new(Environment::from_process()));
    debug!(ty = type_name::<T>(), vars = env.len(), "binding");

    let mut state = BindState::new(env);
    let result = walk(root, &opts, &mut state, action);
    state.finish();
    result
}
