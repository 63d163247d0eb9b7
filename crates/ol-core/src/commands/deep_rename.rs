//! Formula-driven rename of part definitions
//!
//! Every part under the operand nodes gets a candidate name from the formula.
//! Instances of one definition that agree on a candidate end up sharing a
//! fresh definition carrying that name; definitions left without instances
//! are removed. Formulas are evaluated for every instance before the host
//! operation opens, so a bad formula never touches the scene.

use std::collections::{HashMap, HashSet};

use super::{
    CommandContext, DeepRenamePayload, find_node, live_outliner, require_model, resolve_entity,
};
use crate::error::{OutlinerError, OutlinerResult};
use crate::formula::{FormulaEvaluator, InstanceFormulaContext};
use crate::host::{DefinitionId, EntityId, Operation, SceneHost};
use crate::node::{Node, NodeId, NodeType};
use crate::outliner::Outliner;

/// A part instance taking part in the rename
struct PartInstance {
    node: NodeId,
    entity: EntityId,
    context: InstanceFormulaContext,
}

/// Renames planned for the instances of one definition
struct DefinitionPlan {
    definition: DefinitionId,
    /// Candidate name and the entities that evaluated to it, first-seen order
    buckets: Vec<(String, Vec<EntityId>)>,
}

pub fn deep_rename(ctx: CommandContext<'_>, payload: &DeepRenamePayload) -> OutlinerResult<()> {
    let CommandContext {
        outliner,
        host,
        config,
        evaluator,
    } = ctx;
    let outliner = live_outliner(outliner)?;
    require_model(host)?;

    let target = find_node(outliner, payload.id)?;
    if !target.is_root() {
        resolve_entity(host, target)?;
    }

    let operands = operand_set(outliner, target);
    let groups = collect_parts(outliner, host, &operands);
    let plans = plan_renames(evaluator, &payload.formula, groups)?;
    if plans.iter().all(|p| p.buckets.is_empty()) {
        tracing::debug!("Formula '{}' renames nothing", payload.formula);
        return Ok(());
    }

    let mut op = Operation::start(host, config.operations.deep_rename.as_str())?;
    let mut renamed: HashMap<EntityId, DefinitionId> = HashMap::new();
    for plan in &plans {
        for (name, entities) in &plan.buckets {
            let Some((first, rest)) = entities.split_first() else {
                continue;
            };
            let unique = op.make_unique(*first)?;
            for entity in rest {
                op.set_entity_definition(*entity, unique)?;
            }
            op.set_definition_name(unique, name)?;
            renamed.extend(entities.iter().map(|e| (*e, unique)));
        }
        if op
            .definition(plan.definition)
            .is_some_and(|d| d.instance_count == 0)
        {
            op.remove_definition(plan.definition)?;
            tracing::debug!("Removed unused definition {}", plan.definition);
        }
    }
    op.commit()?;
    tracing::info!(
        "Deep rename moved {} instances onto new definitions",
        renamed.len()
    );

    refresh_nodes(outliner, host, &renamed);
    Ok(())
}

/// The selected siblings of a selected target, or the target alone
fn operand_set(outliner: &Outliner, target: &Node) -> Vec<NodeId> {
    let store = outliner.store();
    match target.parent.and_then(|p| store.get(p)) {
        Some(parent) if target.flags.selected => parent
            .children
            .iter()
            .copied()
            .filter(|c| store.get(*c).is_some_and(|n| n.flags.selected))
            .collect(),
        _ => vec![target.id],
    }
}

/// Live part instances under the operands, grouped by definition
fn collect_parts(
    outliner: &Outliner,
    host: &dyn SceneHost,
    operands: &[NodeId],
) -> Vec<(DefinitionId, Vec<PartInstance>)> {
    let store = outliner.store();
    let mut groups: Vec<(DefinitionId, Vec<PartInstance>)> = Vec::new();
    let mut seen = HashSet::new();

    for operand in operands {
        for id in store.descendants_depth_first(*operand) {
            let Some(node) = store.get(id) else {
                continue;
            };
            if node.node_type != NodeType::Part {
                continue;
            }
            let Some(entity) = host.resolve_path(&node.path).and_then(|e| host.entity(e)) else {
                tracing::debug!("Skipping part {} whose entity is gone", id);
                continue;
            };
            // Shared definitions list the same entity under several paths
            if !seen.insert(entity.id) {
                continue;
            }
            let Some(definition) = host.definition(entity.definition) else {
                continue;
            };

            let path = store
                .path_to_root(id)
                .unwrap_or_default()
                .iter()
                .filter(|a| **a != id && **a != store.root_id())
                .filter_map(|a| store.get(*a).map(|n| n.name.clone()))
                .collect();
            let instance = PartInstance {
                node: id,
                entity: entity.id,
                context: InstanceFormulaContext {
                    path,
                    instance_name: entity.name,
                    name: node.name.clone(),
                    definition_name: definition.name,
                    layer: entity.layer,
                    ..InstanceFormulaContext::from_attributes(definition.part.as_ref())
                },
            };

            match groups.iter_mut().find(|(d, _)| *d == definition.id) {
                Some((_, instances)) => instances.push(instance),
                None => groups.push((definition.id, vec![instance])),
            }
        }
    }
    groups
}

/// Evaluate the formula for every instance; the first failure aborts
fn plan_renames(
    evaluator: &dyn FormulaEvaluator,
    formula: &str,
    groups: Vec<(DefinitionId, Vec<PartInstance>)>,
) -> OutlinerResult<Vec<DefinitionPlan>> {
    let mut plans = Vec::with_capacity(groups.len());
    for (definition, instances) in groups {
        let mut buckets: Vec<(String, Vec<EntityId>)> = Vec::new();
        for instance in instances {
            let context = &instance.context;
            let name =
                evaluator
                    .evaluate(formula, context)
                    .map_err(|source| OutlinerError::Formula {
                        node: instance.node,
                        instance_name: context.instance_name.clone(),
                        definition_name: context.definition_name.clone(),
                        source,
                    })?;
            if name.is_empty() || name == context.definition_name {
                continue;
            }
            match buckets.iter_mut().find(|(n, _)| *n == name) {
                Some((_, entities)) => entities.push(instance.entity),
                None => buckets.push((name, vec![instance.entity])),
            }
        }
        plans.push(DefinitionPlan {
            definition,
            buckets,
        });
    }
    Ok(plans)
}

/// Point renamed nodes at their new definitions
fn refresh_nodes(
    outliner: &mut Outliner,
    host: &dyn SceneHost,
    renamed: &HashMap<EntityId, DefinitionId>,
) {
    for node in outliner.store_mut().iter_mut() {
        let Some(entity) = node.entity_id() else {
            continue;
        };
        let Some(definition) = renamed.get(&entity) else {
            continue;
        };
        node.definition = Some(*definition);
        let instance_name = host.entity(entity).map(|e| e.name).unwrap_or_default();
        if instance_name.is_empty()
            && node.node_type.is_instance()
            && let Some(info) = host.definition(*definition)
        {
            node.name = info.name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Harness;
    use crate::commands::{UpdatePayload, update};
    use crate::formula::FormulaError;
    use crate::host::HostError;
    use crate::host::fixtures::FailingScene;

    fn rename(h: &mut Harness, id: NodeId, formula: &str) -> OutlinerResult<()> {
        let payload = DeepRenamePayload {
            id,
            formula: formula.to_string(),
        };
        deep_rename(h.ctx(), &payload)
    }

    fn definition_name(h: &Harness, entity: EntityId) -> String {
        let definition = h.scene().entity(entity).unwrap().definition;
        h.scene().definition(definition).unwrap().name
    }

    #[test]
    fn test_distinct_names_split_definition() {
        let mut h = Harness::new();
        let group = Node::id_for_path(&[h.w.group_a]);
        rename(&mut h, group, "'Panel-' + name").unwrap();

        assert_eq!(definition_name(&h, h.w.part_x), "Panel-A");
        assert_eq!(definition_name(&h, h.w.part_y), "Panel-B");
        assert!(h.scene().definition(h.w.leg).is_none());
        assert_eq!(h.scene().undo_names(), ["Outliner Deep Rename"]);

        let part_x = h.node(&[h.w.group_a, h.w.part_x]);
        assert_eq!(part_x.name, "A");
        assert_eq!(
            part_x.definition,
            Some(h.scene().entity(h.w.part_x).unwrap().definition)
        );
    }

    #[test]
    fn test_equal_names_share_one_definition() {
        let mut h = Harness::new();
        let group = Node::id_for_path(&[h.w.group_a]);
        rename(&mut h, group, "'Panel'").unwrap();

        let x = h.scene().entity(h.w.part_x).unwrap().definition;
        let y = h.scene().entity(h.w.part_y).unwrap().definition;
        assert_eq!(x, y);
        assert_eq!(h.scene().definition(x).unwrap().name, "Panel");
        assert_eq!(h.scene().definition(x).unwrap().instance_count, 2);
        assert!(h.scene().definition(h.w.leg).is_none());
    }

    #[test]
    fn test_unchanged_names_leave_scene_alone() {
        let mut h = Harness::new();
        let root = h.outliner.root_id();
        rename(&mut h, root, "definition_name").unwrap();
        rename(&mut h, root, "''").unwrap();

        assert!(h.scene().undo_names().is_empty());
        assert_eq!(definition_name(&h, h.w.part_x), "Leg");
    }

    #[test]
    fn test_formula_error_aborts_everything() {
        let mut h = Harness::new();
        let before = h.scene().scene().cloned();
        let root = h.outliner.root_id();

        let error = rename(&mut h, root, "'Panel-' + name * 2").unwrap_err();
        let OutlinerError::Formula {
            node,
            instance_name,
            definition_name,
            source,
        } = error
        else {
            panic!("expected a formula error");
        };
        assert_eq!(node, Node::id_for_path(&[h.w.group_a, h.w.part_x]));
        assert_eq!(instance_name, "A");
        assert_eq!(definition_name, "Leg");
        assert!(matches!(source, FormulaError::TypeMismatch { .. }));

        assert_eq!(h.scene().scene().cloned(), before);
        assert!(h.scene().undo_names().is_empty());
    }

    #[test]
    fn test_host_failure_midway_rolls_back() {
        // Second definition rename, the leftover cleanup, and the commit itself
        for (call, succeed) in [
            ("set_definition_name", 1),
            ("remove_definition", 0),
            ("commit_operation", 0),
        ] {
            let mut h = Harness::new();
            let group = Node::id_for_path(&[h.w.group_a]);
            let before = h.w.scene.clone();
            let mut host = FailingScene::new(h.w.scene.clone(), call, succeed);
            let payload = DeepRenamePayload {
                id: group,
                formula: "'Panel-' + name".into(),
            };

            let result = deep_rename(h.ctx_on(&mut host), &payload);

            assert!(
                matches!(result, Err(OutlinerError::Host(HostError::Io(_)))),
                "{} should fail",
                call
            );
            assert_eq!(host.inner.scene(), before.scene(), "{} left changes", call);
            assert!(host.inner.undo_names().is_empty());
            assert!(!host.inner.is_operation_open());
            assert_eq!(
                h.node(&[h.w.group_a, h.w.part_x]).definition,
                Some(h.w.leg)
            );
        }
    }

    #[test]
    fn test_selected_siblings_are_operands() {
        let mut h = Harness::new();
        for path in [vec![h.w.shelf], vec![h.w.drawer]] {
            let mut payload = UpdatePayload::new(Node::id_for_path(&path));
            payload.selected = Some(true);
            update(h.ctx(), &payload).unwrap();
        }

        let shelf = Node::id_for_path(&[h.w.shelf]);
        rename(&mut h, shelf, "'X-' + definition_name").unwrap();

        assert_eq!(definition_name(&h, h.w.shelf), "X-Shelf");
        assert_eq!(definition_name(&h, h.w.front), "X-Front");
        assert_eq!(definition_name(&h, h.w.side), "X-Side");
        assert_eq!(definition_name(&h, h.w.part_x), "Leg");

        // Unnamed instances display their new definition name
        assert_eq!(h.node(&[h.w.drawer, h.w.front]).name, "X-Front");
        assert_eq!(h.node(&[h.w.drawer, h.w.side]).name, "Left");
        assert_eq!(h.node(&[h.w.shelf]).name, "X-Shelf");
    }

    #[test]
    fn test_gone_parts_are_skipped() {
        let mut h = Harness::new();
        h.w.scene.scene_mut().unwrap().erase_entity(h.w.part_x).unwrap();
        let group = Node::id_for_path(&[h.w.group_a]);
        rename(&mut h, group, "'Panel-' + name").unwrap();

        assert_eq!(definition_name(&h, h.w.part_y), "Panel-B");
        assert!(h.scene().definition(h.w.leg).is_none());
    }

    #[test]
    fn test_context_exposes_cutlist_attributes() {
        let mut h = Harness::new();
        let group = Node::id_for_path(&[h.w.group_a]);
        rename(
            &mut h,
            group,
            "path + '/' + bbox_length + 'x' + bbox_width + ' ' + material.name",
        )
        .unwrap();
        assert_eq!(definition_name(&h, h.w.part_x), "Cabinet/720x40 Oak");
        assert_eq!(definition_name(&h, h.w.part_y), "Cabinet/720x40 Oak");
    }

    #[test]
    fn test_gone_target() {
        let mut h = Harness::new();
        h.w.scene.scene_mut().unwrap().erase_entity(h.w.group_a).unwrap();
        let group = Node::id_for_path(&[h.w.group_a]);
        assert_eq!(
            rename(&mut h, group, "name"),
            Err(OutlinerError::EntityGone(group))
        );
    }
}
