use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use roxmltree::{Document, Node};

use crate::app::{CompositeSlot, Facing, NpcAction, Vec2, Waypoint, DIRECTION_COUNT};

use super::compiler::{ContentCompileError, ContentErrorCode, SourceLocation};
use super::database::{MonsterAppearance, MonsterId, MonsterStats, NpcSpawnDef};

const DEFAULT_SPEED_BASE: f32 = 5.0;
const DEFAULT_WEAPON_CLASS: &str = "HTH";

#[derive(Debug, Clone)]
pub(crate) enum ParsedDef {
    Monster(MonsterStats),
    Appearance(MonsterAppearance),
    String { key: String, text: String },
    Spawn(NpcSpawnDef),
}

impl ParsedDef {
    /// Def kind plus name; unique per mod.
    pub(crate) fn identity(&self) -> String {
        match self {
            Self::Monster(def) => format!("MonsterDef '{}'", def.def_name),
            Self::Appearance(def) => format!("MonsterAppearanceDef '{}'", def.def_name),
            Self::String { key, .. } => format!("StringDef '{}'", key),
            Self::Spawn(def) => format!("NpcSpawnDef '{}'", def.def_name),
        }
    }
}

struct ParseContext<'a, 'input> {
    mod_id: &'a str,
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl ParseContext<'_, '_> {
    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentCompileError {
            code,
            message,
            mod_id: self.mod_id.to_string(),
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{}> must not be empty", field_name),
                node,
            ));
        }
        Ok(value)
    }

    fn parse_f32(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<f32, ContentCompileError> {
        let value = self.required_text(node, field_name)?;
        let parsed = value.parse::<f32>().map_err(|_| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} '{}' is not a valid number", field_name, value),
                node,
            )
        })?;
        if !parsed.is_finite() {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} must be finite", field_name),
                node,
            ));
        }
        Ok(parsed)
    }

    fn parse_bool(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<bool, ContentCompileError> {
        let value = self.required_text(node, field_name)?;
        match value.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!(
                    "{} '{}' is not a boolean; allowed values: true, false",
                    field_name, value
                ),
                node,
            )),
        }
    }

    fn missing(&self, field_name: &str, def_type: &str, node: Node<'_, '_>) -> ContentCompileError {
        self.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <{}> in <{}>", field_name, def_type),
            node,
        )
    }

    fn unknown(&self, field_name: &str, def_type: &str, node: Node<'_, '_>) -> ContentCompileError {
        self.error_at(
            ContentErrorCode::UnknownField,
            format!("unknown field <{}> in <{}>", field_name, def_type),
            node,
        )
    }

    /// Element children of `node`, rejecting repeated field names.
    fn fields<'n, 'i>(
        &self,
        node: Node<'n, 'i>,
        def_type: &str,
    ) -> Result<Vec<(String, Node<'n, 'i>)>, ContentCompileError> {
        let mut seen_fields = HashSet::<String>::new();
        let mut fields = Vec::new();
        for field in node.children().filter(|child| child.is_element()) {
            let field_name = field.tag_name().name().to_string();
            if !seen_fields.insert(field_name.clone()) {
                return Err(self.error_at(
                    ContentErrorCode::DuplicateField,
                    format!("duplicate field <{}> in <{}>", field_name, def_type),
                    field,
                ));
            }
            fields.push((field_name, field));
        }
        Ok(fields)
    }
}

pub(crate) fn parse_defs_document(
    mod_id: &str,
    file_path: &Path,
    doc: &Document<'_>,
) -> Result<Vec<ParsedDef>, ContentCompileError> {
    let ctx = ParseContext {
        mod_id,
        file_path,
        doc,
    };
    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    let mut defs = Vec::<ParsedDef>::new();
    for child in root.children().filter(|node| node.is_element()) {
        let def = match child.tag_name().name() {
            "MonsterDef" => ParsedDef::Monster(parse_monster_def(&ctx, child)?),
            "MonsterAppearanceDef" => ParsedDef::Appearance(parse_appearance_def(&ctx, child)?),
            "StringDef" => parse_string_def(&ctx, child)?,
            "NpcSpawnDef" => ParsedDef::Spawn(parse_spawn_def(&ctx, child)?),
            other => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownDefType,
                    format!(
                        "unsupported def type <{}>; expected MonsterDef, MonsterAppearanceDef, StringDef or NpcSpawnDef",
                        other
                    ),
                    child,
                ))
            }
        };
        defs.push(def);
    }

    Ok(defs)
}

fn parse_monster_def(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<MonsterStats, ContentCompileError> {
    const DEF_TYPE: &str = "MonsterDef";
    let mut def_name: Option<String> = None;
    let mut name_string: Option<String> = None;
    let mut animation_token: Option<String> = None;
    let mut speed_base: Option<f32> = None;
    let mut interactable: Option<bool> = None;
    let mut extra_data_key: Option<String> = None;

    for (field_name, field) in ctx.fields(node, DEF_TYPE)? {
        match field_name.as_str() {
            "defName" => def_name = Some(ctx.required_text(field, "defName")?),
            "nameString" => name_string = Some(ctx.required_text(field, "nameString")?),
            "animationToken" => {
                animation_token = Some(ctx.required_text(field, "animationToken")?)
            }
            "speedBase" => {
                let parsed = ctx.parse_f32(field, "speedBase")?;
                if parsed < 0.0 {
                    return Err(ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        "speedBase must be >= 0".to_string(),
                        field,
                    ));
                }
                speed_base = Some(parsed);
            }
            "interactable" => interactable = Some(ctx.parse_bool(field, "interactable")?),
            "extraDataKey" => extra_data_key = Some(ctx.required_text(field, "extraDataKey")?),
            _ => return Err(ctx.unknown(&field_name, DEF_TYPE, field)),
        }
    }

    let Some(def_name) = def_name else {
        return Err(ctx.missing("defName", DEF_TYPE, node));
    };
    let Some(animation_token) = animation_token else {
        return Err(ctx.missing("animationToken", DEF_TYPE, node));
    };

    Ok(MonsterStats {
        id: MonsterId(0),
        name_string: name_string.unwrap_or_else(|| def_name.clone()),
        extra_data_key: extra_data_key.unwrap_or_else(|| def_name.clone()),
        def_name,
        animation_token,
        speed_base: speed_base.unwrap_or(DEFAULT_SPEED_BASE),
        interactable: interactable.unwrap_or(false),
    })
}

fn parse_appearance_def(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<MonsterAppearance, ContentCompileError> {
    const DEF_TYPE: &str = "MonsterAppearanceDef";
    let mut def_name: Option<String> = None;
    let mut base_weapon_class: Option<String> = None;
    let mut equipment_options = BTreeMap::<CompositeSlot, Vec<String>>::new();

    for (field_name, field) in ctx.fields(node, DEF_TYPE)? {
        match field_name.as_str() {
            "defName" => def_name = Some(ctx.required_text(field, "defName")?),
            "baseWeaponClass" => {
                base_weapon_class = Some(ctx.required_text(field, "baseWeaponClass")?)
            }
            "equipment" => {
                for (slot_name, slot_node) in ctx.fields(field, "equipment")? {
                    let Some(slot) = CompositeSlot::from_token(&slot_name) else {
                        return Err(ctx.error_at(
                            ContentErrorCode::InvalidValue,
                            format!("unknown composite slot <{}>", slot_name),
                            slot_node,
                        ));
                    };
                    let options = parse_list_items(ctx, slot_node, &slot_name)?
                        .into_iter()
                        .map(|item| ctx.required_text(item, "li"))
                        .collect::<Result<Vec<_>, _>>()?;
                    equipment_options.insert(slot, options);
                }
            }
            _ => return Err(ctx.unknown(&field_name, DEF_TYPE, field)),
        }
    }

    let Some(def_name) = def_name else {
        return Err(ctx.missing("defName", DEF_TYPE, node));
    };

    Ok(MonsterAppearance {
        def_name,
        base_weapon_class: base_weapon_class.unwrap_or_else(|| DEFAULT_WEAPON_CLASS.to_string()),
        equipment_options,
    })
}

fn parse_string_def(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<ParsedDef, ContentCompileError> {
    const DEF_TYPE: &str = "StringDef";
    let mut key: Option<String> = None;
    let mut text: Option<String> = None;

    for (field_name, field) in ctx.fields(node, DEF_TYPE)? {
        match field_name.as_str() {
            "key" => key = Some(ctx.required_text(field, "key")?),
            "text" => text = Some(ctx.required_text(field, "text")?),
            _ => return Err(ctx.unknown(&field_name, DEF_TYPE, field)),
        }
    }

    let Some(key) = key else {
        return Err(ctx.missing("key", DEF_TYPE, node));
    };
    let Some(text) = text else {
        return Err(ctx.missing("text", DEF_TYPE, node));
    };
    Ok(ParsedDef::String { key, text })
}

fn parse_spawn_def(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<NpcSpawnDef, ContentCompileError> {
    const DEF_TYPE: &str = "NpcSpawnDef";
    let mut def_name: Option<String> = None;
    let mut monster: Option<String> = None;
    let mut x: Option<f32> = None;
    let mut y: Option<f32> = None;
    let mut facing: Option<Facing> = None;
    let mut path = Vec::<Waypoint>::new();

    for (field_name, field) in ctx.fields(node, DEF_TYPE)? {
        match field_name.as_str() {
            "defName" => def_name = Some(ctx.required_text(field, "defName")?),
            "monster" => monster = Some(ctx.required_text(field, "monster")?),
            "x" => x = Some(ctx.parse_f32(field, "x")?),
            "y" => y = Some(ctx.parse_f32(field, "y")?),
            "facing" => facing = Some(parse_facing(ctx, field)?),
            "path" => {
                path = parse_list_items(ctx, field, "path")?
                    .into_iter()
                    .map(|item| parse_waypoint(ctx, item))
                    .collect::<Result<Vec<_>, _>>()?;
            }
            _ => return Err(ctx.unknown(&field_name, DEF_TYPE, field)),
        }
    }

    let Some(def_name) = def_name else {
        return Err(ctx.missing("defName", DEF_TYPE, node));
    };
    let Some(monster) = monster else {
        return Err(ctx.missing("monster", DEF_TYPE, node));
    };
    let (Some(x), Some(y)) = (x, y) else {
        return Err(ctx.missing("x/y", DEF_TYPE, node));
    };

    Ok(NpcSpawnDef {
        def_name,
        monster,
        position: Vec2::new(x, y),
        facing: facing.unwrap_or_default(),
        path,
    })
}

fn parse_facing(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<Facing, ContentCompileError> {
    let value = ctx.required_text(node, "facing")?;
    match value.parse::<u8>() {
        Ok(index) if index < DIRECTION_COUNT => Ok(Facing::new(index)),
        _ => Err(ctx.error_at(
            ContentErrorCode::InvalidValue,
            format!(
                "facing '{}' must be an integer in 0..{}",
                value, DIRECTION_COUNT
            ),
            node,
        )),
    }
}

fn parse_waypoint(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<Waypoint, ContentCompileError> {
    const DEF_TYPE: &str = "path/li";
    let mut x: Option<f32> = None;
    let mut y: Option<f32> = None;
    let mut action: Option<NpcAction> = None;

    for (field_name, field) in ctx.fields(node, DEF_TYPE)? {
        match field_name.as_str() {
            "x" => x = Some(ctx.parse_f32(field, "x")?),
            "y" => y = Some(ctx.parse_f32(field, "y")?),
            "action" => {
                let value = ctx.required_text(field, "action")?;
                let Some(parsed) = NpcAction::parse(&value) else {
                    return Err(ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        format!(
                            "invalid action '{}'; allowed values: Invalid, Action1, Action2, Action3, Skill1 or codes 0-4",
                            value
                        ),
                        field,
                    ));
                };
                action = Some(parsed);
            }
            _ => return Err(ctx.unknown(&field_name, DEF_TYPE, field)),
        }
    }

    let (Some(x), Some(y)) = (x, y) else {
        return Err(ctx.missing("x/y", DEF_TYPE, node));
    };
    Ok(Waypoint::new(Vec2::new(x, y), action.unwrap_or_default()))
}

fn parse_list_items<'n, 'i>(
    ctx: &ParseContext<'_, '_>,
    node: Node<'n, 'i>,
    list_name: &str,
) -> Result<Vec<Node<'n, 'i>>, ContentCompileError> {
    let mut items = Vec::new();
    for child in node.children().filter(|child| child.is_element()) {
        if child.tag_name().name() != "li" {
            return Err(ctx.error_at(
                ContentErrorCode::UnknownField,
                format!(
                    "<{}> may only contain <li> items, found <{}>",
                    list_name,
                    child.tag_name().name()
                ),
                child,
            ));
        }
        items.push(child);
    }
    Ok(items)
}
