use log::warn;

use intercession_shared::{EventKind, Message, TimejumpConditions, Vec3};

use super::{
    Behavior, BehaviorRegistry, Component, Cosmos, Departure, SerializationFilter, Signature,
    Timejump, Transform, Velocity,
};
use crate::CosmosError;

/// The fixed set of systems a cosmos runs every fixed update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dynamo {
    /// Integrates velocity into position
    Kinematics,
    /// Runs registered behaviors
    Behaviors,
    /// Turns requested timejumps into departures
    Timejumps,
}

impl Dynamo {
    /// Execution order within one fixed update
    pub const PIPELINE: [Dynamo; 3] = [Dynamo::Behaviors, Dynamo::Kinematics, Dynamo::Timejumps];

    pub fn run(
        self,
        cosmos: &mut Cosmos,
        behaviors: &BehaviorRegistry,
        delta_secs: f32,
    ) -> Result<(), CosmosError> {
        match self {
            Dynamo::Kinematics => run_kinematics(cosmos, delta_secs),
            Dynamo::Behaviors => run_behaviors(cosmos, behaviors),
            Dynamo::Timejumps => run_timejumps(cosmos),
        }
    }
}

fn run_kinematics(cosmos: &mut Cosmos, delta_secs: f32) -> Result<(), CosmosError> {
    let moving = Signature::EMPTY.with(Transform::KIND).with(Velocity::KIND);
    for entity in cosmos.entities_with(moving) {
        let linear = match cosmos.get_component::<Velocity>(entity) {
            Some(velocity) => velocity.linear,
            None => continue,
        };
        if linear == Vec3::ZERO {
            continue;
        }
        if let Some(transform) = cosmos.get_component_mut::<Transform>(entity) {
            transform.position += linear * delta_secs;
        }
    }
    Ok(())
}

fn run_behaviors(cosmos: &mut Cosmos, behaviors: &BehaviorRegistry) -> Result<(), CosmosError> {
    let signature = Signature::EMPTY.with(Behavior::KIND);
    for entity in cosmos.entities_with(signature) {
        if cosmos.is_condemned(entity) {
            continue;
        }
        let Some(tag) = cosmos.get_component::<Behavior>(entity).map(|b| b.tag) else {
            continue;
        };
        match behaviors.get(tag) {
            Some(behavior) => behavior(cosmos, entity)?,
            None => warn!("no behavior registered for {:?} on {:?}", tag, entity),
        }
    }
    Ok(())
}

fn run_timejumps(cosmos: &mut Cosmos) -> Result<(), CosmosError> {
    let signature = Signature::EMPTY.with(Timejump::KIND);
    for entity in cosmos.entities_with(signature) {
        let Some(jump) = cosmos.remove_component::<Timejump>(entity) else {
            continue;
        };
        let origin = cosmos
            .get_component::<Transform>(entity)
            .map(|transform| transform.position)
            .unwrap_or(Vec3::ZERO);

        let mut components = Message::new(EventKind::JumpArrival);
        cosmos.serialize_entity_components(
            entity,
            Signature::ALL,
            &mut components,
            SerializationFilter::All,
        )?;

        cosmos.push_departure(Departure {
            entity,
            destination: jump.destination,
            conditions: TimejumpConditions::new(jump.trip_id, origin),
            causal_link: cosmos.causal_link(entity),
            components,
        });
        cosmos.condemn_entity(entity);
    }
    Ok(())
}
