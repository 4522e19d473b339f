use intercession_server::{BehaviorRegistry, BehaviorTag, Velocity};

/// Adds one unit per tick to an entity's velocity along x
pub const ACCELERATE: BehaviorTag = BehaviorTag::new(1);
/// Condemns the entity on its first update
pub const SELF_DESTRUCT: BehaviorTag = BehaviorTag::new(2);

/// A registry holding every sample behavior
pub fn sample_behaviors() -> BehaviorRegistry {
    let mut behaviors = BehaviorRegistry::new();
    behaviors.register(ACCELERATE, |cosmos, entity| {
        if let Some(velocity) = cosmos.get_component_mut::<Velocity>(entity) {
            velocity.linear.x += 1.0;
        }
        Ok(())
    });
    behaviors.register(SELF_DESTRUCT, |cosmos, entity| {
        cosmos.condemn_entity(entity);
        Ok(())
    });
    behaviors
}
