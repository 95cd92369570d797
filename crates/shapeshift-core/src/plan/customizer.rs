//! Registration API for mapping plan overrides
//!
//! A [`MappingDefinition`] describes the overrides for one type pair. The
//! engine hands it a [`PlanCustomizer`] bound to that pair, either when the
//! caller registers it explicitly or when a [`CustomizationSource`] reports it
//! at first use of the pair.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::registry::{PlanPair, PlanRegistry};
use super::{MemberMapEntry, ValueFn};
use crate::error::{Error, Result};
use crate::shape::{MemberInfo, Shape};
use crate::types::TypeRef;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Overrides for one (source, target) pair
pub trait MappingDefinition: Send + Sync {
    fn source_type(&self) -> TypeRef;

    fn target_type(&self) -> TypeRef;

    /// Install overrides through the customizer
    fn configure(&self, customizer: &mut PlanCustomizer<'_>) -> Result<()>;
}

/// Closure-backed [`MappingDefinition`]
pub struct CustomMapping<F> {
    source: TypeRef,
    target: TypeRef,
    configure: F,
}

impl<F> CustomMapping<F>
where
    F: Fn(&mut PlanCustomizer<'_>) -> Result<()> + Send + Sync,
{
    pub fn new(source: TypeRef, target: TypeRef, configure: F) -> Self {
        Self {
            source,
            target,
            configure,
        }
    }
}

impl<F> MappingDefinition for CustomMapping<F>
where
    F: Fn(&mut PlanCustomizer<'_>) -> Result<()> + Send + Sync,
{
    fn source_type(&self) -> TypeRef {
        self.source.clone()
    }

    fn target_type(&self) -> TypeRef {
        self.target.clone()
    }

    fn configure(&self, customizer: &mut PlanCustomizer<'_>) -> Result<()> {
        (self.configure)(customizer)
    }
}

impl<F> fmt::Debug for CustomMapping<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomMapping")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Discovery of mapping definitions
///
/// Consulted once per type pair, the first time the pair is used.
pub trait CustomizationSource: Send + Sync {
    fn definitions_for(&self, source: &TypeRef, target: &TypeRef) -> Vec<Arc<dyn MappingDefinition>>;
}

/// Vector-backed [`CustomizationSource`]
#[derive(Default, Clone)]
pub struct StaticCustomizations {
    definitions: Vec<Arc<dyn MappingDefinition>>,
}

impl StaticCustomizations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, definition: impl MappingDefinition + 'static) -> Self {
        self.push(Arc::new(definition));
        self
    }

    pub fn push(&mut self, definition: Arc<dyn MappingDefinition>) {
        self.definitions.push(definition);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl CustomizationSource for StaticCustomizations {
    fn definitions_for(&self, source: &TypeRef, target: &TypeRef) -> Vec<Arc<dyn MappingDefinition>> {
        self.definitions
            .iter()
            .filter(|definition| {
                definition.source_type() == *source && definition.target_type() == *target
            })
            .cloned()
            .collect()
    }
}

impl fmt::Debug for StaticCustomizations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCustomizations")
            .field("definitions", &self.definitions.len())
            .finish()
    }
}

/// Override registration bound to one type pair
///
/// Every method validates against the pair's shapes and fails with a setup
/// error before touching the registry, so a rejected call leaves both the
/// forward and the reverse plan unchanged.
pub struct PlanCustomizer<'a> {
    plans: &'a PlanRegistry,
    source: Arc<Shape>,
    target: Arc<Shape>,
}

impl<'a> PlanCustomizer<'a> {
    /// Bind to a pair; only object pairs take member overrides
    pub fn new(plans: &'a PlanRegistry, source: Arc<Shape>, target: Arc<Shape>) -> Result<Self> {
        if !source.is_object() || !target.is_object() {
            return Err(Error::setup(
                "cannot customize conversions for value/element types",
                source.ty(),
                target.ty(),
            ));
        }
        Ok(Self {
            plans,
            source,
            target,
        })
    }

    pub fn source_type(&self) -> &TypeRef {
        self.source.ty()
    }

    pub fn target_type(&self) -> &TypeRef {
        self.target.ty()
    }

    fn pair(&self) -> PlanPair {
        (self.source.ty().clone(), self.target.ty().clone())
    }

    fn reverse_pair(&self) -> PlanPair {
        (self.target.ty().clone(), self.source.ty().clone())
    }

    fn error(&self, message: String) -> Error {
        Error::setup(message, self.source.ty(), self.target.ty())
    }

    fn accessor<'s>(&self, shape: &'s Shape, name: &str) -> Result<&'s MemberInfo> {
        shape.member(name).ok_or_else(|| {
            self.error(format!(
                "'{name}' is not a plain member accessor of {}",
                shape.ty()
            ))
        })
    }

    fn readable<'s>(&self, shape: &'s Shape, name: &str) -> Result<&'s MemberInfo> {
        let member = self.accessor(shape, name)?;
        if !member.readable {
            return Err(self.error(format!("member {}.{name} is not readable", shape.ty())));
        }
        Ok(member)
    }

    fn writable<'s>(&self, shape: &'s Shape, name: &str) -> Result<&'s MemberInfo> {
        let member = self.accessor(shape, name)?;
        if !member.writable {
            return Err(self.error(format!("member {}.{name} is not writable", shape.ty())));
        }
        Ok(member)
    }

    /// Populate a target member from a differently named source member
    pub fn map_member(&mut self, target_member: &str, source_member: &str) -> Result<&mut Self> {
        let target = self.writable(&self.target, target_member)?;
        let source = self.readable(&self.source, source_member)?;
        let entry = MemberMapEntry::member(
            target_member,
            source_member,
            source.ty.clone(),
            target.ty.clone(),
        );
        self.plans.register(&self.pair(), entry)?;
        Ok(self)
    }

    /// Populate a target member from a computed source expression
    ///
    /// `value_type` is the type `compute` produces; the engine converts it to
    /// the target member's type.
    pub fn map_from<F>(
        &mut self,
        target_member: &str,
        label: &str,
        value_type: TypeRef,
        compute: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let target = self.writable(&self.target, target_member)?;
        let compute: ValueFn = Arc::new(compute);
        let entry = MemberMapEntry::computed(target_member, label, compute, value_type, target.ty.clone());
        self.plans.register(&self.pair(), entry)?;
        Ok(self)
    }

    /// Member correspondence in both directions
    pub fn map_two_way(&mut self, target_member: &str, source_member: &str) -> Result<&mut Self> {
        let target = self.writable(&self.target, target_member)?;
        let source = self.readable(&self.source, source_member)?;
        self.readable(&self.target, target_member)?;
        self.writable(&self.source, source_member)?;

        let forward = MemberMapEntry::member(
            target_member,
            source_member,
            source.ty.clone(),
            target.ty.clone(),
        );
        let reverse = MemberMapEntry::member(
            source_member,
            target_member,
            target.ty.clone(),
            source.ty.clone(),
        );
        self.plans
            .register_pair(&self.pair(), forward, &self.reverse_pair(), reverse)?;
        Ok(self)
    }

    /// Populate a source member when mapping in the opposite direction
    ///
    /// `compute` receives the target-typed value being mapped back.
    pub fn map_reverse<F>(
        &mut self,
        source_member: &str,
        label: &str,
        value_type: TypeRef,
        compute: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let source = self.writable(&self.source, source_member)?;
        let compute: ValueFn = Arc::new(compute);
        let entry = MemberMapEntry::computed(source_member, label, compute, value_type, source.ty.clone());
        self.plans.register(&self.reverse_pair(), entry)?;
        Ok(self)
    }

    /// Leave a target member untouched even if a source member matches by name
    pub fn ignore(&mut self, target_member: &str) -> Result<&mut Self> {
        self.accessor(&self.target, target_member)?;
        self.plans.ignore(&self.pair(), target_member)?;
        Ok(self)
    }

    /// Remove the override for a target member
    pub fn unmap(&mut self, target_member: &str) -> Result<&mut Self> {
        self.accessor(&self.target, target_member)?;
        self.plans.unregister(&self.pair(), target_member)?;
        Ok(self)
    }

    /// Remove a two-way override and its mirror on the reverse plan
    pub fn unmap_two_way(&mut self, target_member: &str, source_member: &str) -> Result<&mut Self> {
        self.accessor(&self.target, target_member)?;
        self.accessor(&self.source, source_member)?;
        self.plans
            .unregister_pair(&self.pair(), target_member, &self.reverse_pair(), source_member)?;
        Ok(self)
    }

    /// Remove a reverse override
    pub fn unmap_reverse(&mut self, source_member: &str) -> Result<&mut Self> {
        self.accessor(&self.source, source_member)?;
        self.plans.unregister(&self.reverse_pair(), source_member)?;
        Ok(self)
    }
}

impl fmt::Debug for PlanCustomizer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanCustomizer")
            .field("source", self.source.ty())
            .field("target", self.target.ty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::PrimitiveKind;

    fn order() -> Arc<Shape> {
        Arc::new(Shape::object(
            TypeRef::named("Order"),
            vec![
                MemberInfo::new("id", TypeRef::I32),
                MemberInfo::new("total", TypeRef::F64),
                MemberInfo::new("code", TypeRef::STRING).read_only(),
            ],
            true,
        ))
    }

    fn order_dto() -> Arc<Shape> {
        Arc::new(Shape::object(
            TypeRef::named("OrderDto"),
            vec![
                MemberInfo::new("id", TypeRef::I64),
                MemberInfo::new("amount", TypeRef::STRING),
                MemberInfo::new("reference", TypeRef::STRING),
            ],
            true,
        ))
    }

    #[test]
    fn test_value_pairs_cannot_be_customized() {
        let plans = PlanRegistry::new();
        let err = PlanCustomizer::new(&plans, Arc::new(Shape::primitive(PrimitiveKind::I32)), order_dto())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Setup);
        assert!(err.to_string().contains("value/element types"));
    }

    #[test]
    fn test_map_member_rejects_unknown_accessor() {
        let plans = PlanRegistry::new();
        let mut customizer = PlanCustomizer::new(&plans, order(), order_dto()).unwrap();
        let err = customizer.map_member("amount", "missing").unwrap_err();
        assert!(err.to_string().contains("not a plain member accessor"));
        assert!(customizer.map_member("amount", "total").is_ok());
    }

    #[test]
    fn test_two_way_registers_mirror() {
        let plans = PlanRegistry::new();
        let mut customizer = PlanCustomizer::new(&plans, order(), order_dto()).unwrap();
        customizer.map_two_way("amount", "total").unwrap();

        let forward = plans.current(&order(), &order_dto());
        assert_eq!(forward.entry("amount").unwrap().source_label(), "total");
        let reverse = plans.current(&order_dto(), &order());
        assert_eq!(reverse.entry("total").unwrap().source_label(), "amount");

        customizer.unmap_two_way("amount", "total").unwrap();
        assert!(plans.current(&order(), &order_dto()).entry("amount").is_none());
        assert!(plans.current(&order_dto(), &order()).entry("total").is_none());
    }

    #[test]
    fn test_two_way_needs_writable_source() {
        let plans = PlanRegistry::new();
        let mut customizer = PlanCustomizer::new(&plans, order(), order_dto()).unwrap();
        assert!(customizer.map_two_way("reference", "code").is_err());
        // nothing was registered on either side
        assert!(plans.current(&order(), &order_dto()).entry("reference").is_none());
        assert!(customizer.map_member("reference", "code").is_ok());
    }

    #[test]
    fn test_reverse_and_computed() {
        let plans = PlanRegistry::new();
        let mut customizer = PlanCustomizer::new(&plans, order(), order_dto()).unwrap();
        customizer
            .map_from("reference", "\"ORD-\" + id", TypeRef::STRING, |order: &Value| {
                let id = order.as_object().map(|o| o.field("id")).unwrap_or(Value::Null);
                Ok(Value::from(format!("ORD-{id}")))
            })
            .unwrap()
            .map_reverse("total", "amount.parse()", TypeRef::STRING, |dto: &Value| {
                Ok(dto.as_object().map(|o| o.field("amount")).unwrap_or(Value::Null))
            })
            .unwrap();
        assert_eq!(
            plans.current(&order(), &order_dto()).entry("reference").unwrap().source_label(),
            "\"ORD-\" + id"
        );
        assert_eq!(
            plans.current(&order_dto(), &order()).entry("total").unwrap().source_label(),
            "amount.parse()"
        );
    }

    #[test]
    fn test_static_customizations_filter_by_pair() {
        let customizations = StaticCustomizations::new()
            .with(CustomMapping::new(TypeRef::named("Order"), TypeRef::named("OrderDto"), |c| {
                c.ignore("id")?;
                Ok(())
            }))
            .with(CustomMapping::new(TypeRef::named("A"), TypeRef::named("B"), |_| Ok(())));
        assert_eq!(customizations.len(), 2);
        let found = customizations.definitions_for(&TypeRef::named("Order"), &TypeRef::named("OrderDto"));
        assert_eq!(found.len(), 1);

        let plans = PlanRegistry::new();
        let mut customizer = PlanCustomizer::new(&plans, order(), order_dto()).unwrap();
        found[0].configure(&mut customizer).unwrap();
        assert!(plans.current(&order(), &order_dto()).entry("id").is_none());
    }
}
