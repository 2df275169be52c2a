// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element table extraction - one row per `IfcElement` with flattened
//! property sets and quantities.

use crate::model::IfcModel;
use crate::table::{CellValue, Table};
use ifc_report_core::{
    element_type_name, is_element_type, AttributeValue, DecodedEntity, EntityDecoder,
    EntityIndex, EntityScanner,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const GUID_COLUMN: &str = "GUID";
pub const NAME_COLUMN: &str = "Name";
pub const TYPE_COLUMN: &str = "Type";
pub const OBJECT_TYPE_COLUMN: &str = "ObjectType";
pub const TAG_COLUMN: &str = "Tag";
pub const TYPE_NAME_COLUMN: &str = "TypeName";
pub const STOREY_COLUMN: &str = "Storey";

/// Base columns in output order; the first three are always present.
const BASE_COLUMNS: [&str; 7] = [
    GUID_COLUMN,
    NAME_COLUMN,
    TYPE_COLUMN,
    OBJECT_TYPE_COLUMN,
    TAG_COLUMN,
    TYPE_NAME_COLUMN,
    STOREY_COLUMN,
];
const ALWAYS_PRESENT: usize = 3;

/// Separator between property set name and property name in column headers.
pub const PROPERTY_SEPARATOR: &str = ".";

/// Statement located by the scanner, decoded later.
struct EntityJob {
    id: u32,
    start: usize,
    end: usize,
}

/// Decoded property set or element quantity.
struct PropertyGroup {
    name: String,
    values: Vec<(String, CellValue)>,
}

/// Type object attached through `IfcRelDefinesByType`.
#[derive(Default)]
struct TypeObject {
    name: Option<String>,
    property_sets: Vec<u32>,
}

/// Relationship lookups keyed by element id.
#[derive(Default)]
struct ElementLinks {
    /// element -> property definitions in file order
    property_definitions: FxHashMap<u32, Vec<u32>>,
    /// element -> type object
    type_objects: FxHashMap<u32, u32>,
    /// element -> storey name
    storeys: FxHashMap<u32, String>,
}

/// One extracted element before column alignment.
struct ElementRow {
    base: [CellValue; BASE_COLUMNS.len()],
    properties: BTreeMap<String, CellValue>,
}

/// Extract the element table of a model.
///
/// Columns: `GUID`, `Name`, `Type`, then `ObjectType`/`Tag`/`TypeName`/`Storey`
/// when any element carries them, then `Pset.Property` columns sorted by name.
/// Type-object properties come first and occurrence properties override them.
pub fn extract_elements(model: &IfcModel) -> Table {
    let extract_start = std::time::Instant::now();
    let content = model.content();
    let index = model.index();

    let mut element_jobs = Vec::new();
    let mut group_jobs = Vec::new();
    let mut rel_jobs = Vec::new();

    let mut scanner = EntityScanner::new(content);
    while let Some((id, type_name, start, end)) = scanner.next_entity() {
        let job = EntityJob { id, start, end };
        if type_name.eq_ignore_ascii_case("IFCPROPERTYSET")
            || type_name.eq_ignore_ascii_case("IFCELEMENTQUANTITY")
        {
            group_jobs.push(job);
        } else if type_name.eq_ignore_ascii_case("IFCRELDEFINESBYPROPERTIES")
            || type_name.eq_ignore_ascii_case("IFCRELDEFINESBYTYPE")
            || type_name.eq_ignore_ascii_case("IFCRELCONTAINEDINSPATIALSTRUCTURE")
        {
            rel_jobs.push(job);
        } else if is_element_type(type_name) {
            element_jobs.push(job);
        }
    }

    tracing::debug!(
        elements = element_jobs.len(),
        property_groups = group_jobs.len(),
        relationships = rel_jobs.len(),
        "Scanned model entities"
    );

    let groups = extract_property_groups(&group_jobs, content, index);
    let (links, type_objects) = extract_links(&rel_jobs, content, index);

    let rows: Vec<ElementRow> = element_jobs
        .par_iter()
        .filter_map(|job| {
            let mut decoder = EntityDecoder::with_arc_index(content, index.clone());
            let entity = decoder.decode_at_with_id(job.id, job.start, job.end).ok()?;
            Some(element_row(&entity, &links, &type_objects, &groups))
        })
        .collect();

    let table = build_table(rows);
    tracing::info!(
        rows = table.row_count(),
        columns = table.column_count(),
        extract_time_ms = extract_start.elapsed().as_millis(),
        "Element extraction complete"
    );
    table
}

/// Decode every property set and element quantity once, in parallel.
fn extract_property_groups(
    jobs: &[EntityJob],
    content: &str,
    index: &Arc<EntityIndex>,
) -> FxHashMap<u32, PropertyGroup> {
    jobs.par_iter()
        .filter_map(|job| {
            let mut decoder = EntityDecoder::with_arc_index(content, index.clone());
            let entity = decoder.decode_at_with_id(job.id, job.start, job.end).ok()?;

            // IfcPropertySet:     [2]=Name, [4]=HasProperties
            // IfcElementQuantity: [2]=Name, [5]=Quantities
            let name = entity.get_string(2)?.to_string();
            let members = if entity.is_type("IFCPROPERTYSET") {
                entity.get_ref_list(4)
            } else {
                entity.get_ref_list(5)
            };

            let values = members
                .into_iter()
                .filter_map(|member_id| decoder.decode_by_id(member_id).ok())
                .filter_map(|member| property_value(&member))
                .collect();

            Some((job.id, PropertyGroup { name, values }))
        })
        .collect()
}

/// Resolve property, type and containment relationships.
fn extract_links(
    jobs: &[EntityJob],
    content: &str,
    index: &Arc<EntityIndex>,
) -> (ElementLinks, FxHashMap<u32, TypeObject>) {
    let mut decoder = EntityDecoder::with_arc_index(content, index.clone());
    let mut links = ElementLinks::default();
    let mut type_objects: FxHashMap<u32, TypeObject> = FxHashMap::default();
    let mut storey_names: FxHashMap<u32, Option<String>> = FxHashMap::default();

    for job in jobs {
        let Ok(rel) = decoder.decode_at_with_id(job.id, job.start, job.end) else {
            continue;
        };

        // All three relationships: [4]=Related*, [5]=Relating*
        let related = rel.get_ref_list(4);

        if rel.is_type("IFCRELDEFINESBYPROPERTIES") {
            // IFC4 allows a set of definitions on the relating side
            let definitions = match rel.get_ref(5) {
                Some(id) => vec![id],
                None => rel.get_ref_list(5),
            };
            for element_id in related {
                links
                    .property_definitions
                    .entry(element_id)
                    .or_default()
                    .extend_from_slice(&definitions);
            }
        } else if rel.is_type("IFCRELDEFINESBYTYPE") {
            let Some(type_id) = rel.get_ref(5) else {
                continue;
            };
            type_objects.entry(type_id).or_insert_with(|| {
                // IfcTypeObject: [2]=Name, [5]=HasPropertySets
                decoder
                    .decode_by_id(type_id)
                    .map(|object| TypeObject {
                        name: object.get_string(2).map(str::to_string),
                        property_sets: object.get_ref_list(5),
                    })
                    .unwrap_or_default()
            });
            for element_id in related {
                links.type_objects.insert(element_id, type_id);
            }
        } else {
            let Some(container_id) = rel.get_ref(5) else {
                continue;
            };
            let storey = storey_names
                .entry(container_id)
                .or_insert_with(|| storey_name(&mut decoder, container_id))
                .clone();
            if let Some(storey) = storey {
                for element_id in related {
                    links.storeys.insert(element_id, storey.clone());
                }
            }
        }
    }

    (links, type_objects)
}

/// Name of a spatial container if it is a building storey; `LongName` when
/// the storey has no `Name`.
fn storey_name(decoder: &mut EntityDecoder, container_id: u32) -> Option<String> {
    let container = decoder.decode_by_id(container_id).ok()?;
    if !container.is_type("IFCBUILDINGSTOREY") {
        return None;
    }
    container
        .get_string(2)
        .or_else(|| container.get_string(7))
        .map(str::to_string)
}

/// Assemble one element row.
fn element_row(
    entity: &DecodedEntity,
    links: &ElementLinks,
    type_objects: &FxHashMap<u32, TypeObject>,
    groups: &FxHashMap<u32, PropertyGroup>,
) -> ElementRow {
    let text = |index: usize| CellValue::from(entity.get_string(index).map(str::to_string));
    let type_object = links
        .type_objects
        .get(&entity.id)
        .and_then(|id| type_objects.get(id));

    // IfcElement: [0]=GlobalId, [2]=Name, [4]=ObjectType, [7]=Tag
    let base = [
        text(0),
        text(2),
        CellValue::from(
            element_type_name(&entity.type_name).unwrap_or(entity.type_name.as_str()),
        ),
        text(4),
        text(7),
        CellValue::from(type_object.and_then(|t| t.name.clone())),
        CellValue::from(links.storeys.get(&entity.id).cloned()),
    ];

    let mut properties = BTreeMap::new();
    let type_sets = type_object.map(|t| t.property_sets.as_slice()).unwrap_or_default();
    let occurrence_sets = links
        .property_definitions
        .get(&entity.id)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for group in type_sets
        .iter()
        .chain(occurrence_sets)
        .filter_map(|id| groups.get(id))
    {
        for (name, value) in &group.values {
            properties.insert(
                format!("{}{}{}", group.name, PROPERTY_SEPARATOR, name),
                value.clone(),
            );
        }
    }

    ElementRow { base, properties }
}

/// Align rows on the union of their columns.
fn build_table(rows: Vec<ElementRow>) -> Table {
    let base_present: Vec<usize> = (0..BASE_COLUMNS.len())
        .filter(|&i| i < ALWAYS_PRESENT || rows.iter().any(|row| !row.base[i].is_null()))
        .collect();
    let property_columns: BTreeSet<&String> =
        rows.iter().flat_map(|row| row.properties.keys()).collect();

    let mut columns: Vec<String> = base_present.iter().map(|&i| BASE_COLUMNS[i].to_string()).collect();
    columns.extend(property_columns.iter().map(|name| (*name).clone()));

    let property_columns: Vec<String> = property_columns.into_iter().cloned().collect();
    let cells = rows
        .into_iter()
        .map(|mut row| {
            let mut cells: Vec<CellValue> = base_present
                .iter()
                .map(|&i| std::mem::take(&mut row.base[i]))
                .collect();
            cells.extend(
                property_columns
                    .iter()
                    .map(|name| row.properties.remove(name).unwrap_or_default()),
            );
            cells
        })
        .collect();

    Table::from_parts(columns, cells)
}

/// Name and value of a property or physical quantity entity.
fn property_value(entity: &DecodedEntity) -> Option<(String, CellValue)> {
    let name = entity.get_string(0)?.to_string();
    let type_name = entity.type_name.to_ascii_uppercase();

    let value = match type_name.as_str() {
        // [2]=NominalValue
        "IFCPROPERTYSINGLEVALUE" => entity.get(2).map(cell_value).unwrap_or_default(),
        // [2]=EnumerationValues / ListValues
        "IFCPROPERTYENUMERATEDVALUE" | "IFCPROPERTYLISTVALUE" => entity
            .get_list(2)
            .map(join_values)
            .unwrap_or_default(),
        // [3]=LengthValue/AreaValue/...; all physical quantities share the layout
        "IFCQUANTITYLENGTH" | "IFCQUANTITYAREA" | "IFCQUANTITYVOLUME" | "IFCQUANTITYCOUNT"
        | "IFCQUANTITYWEIGHT" | "IFCQUANTITYTIME" => {
            entity.get(3).map(cell_value).unwrap_or_default()
        }
        _ => return None,
    };

    Some((name, value))
}

/// Convert an attribute to a cell, unwrapping defined-type wrappers.
fn cell_value(attr: &AttributeValue) -> CellValue {
    let (type_name, inner) = attr.unwrap_typed();
    match inner {
        AttributeValue::String(s) => CellValue::Text(s.clone()),
        AttributeValue::Integer(i) => CellValue::Integer(*i),
        AttributeValue::Float(f) => CellValue::Number(*f),
        AttributeValue::Enum(e) => {
            let logical = type_name.is_some_and(|t| {
                t.eq_ignore_ascii_case("IFCBOOLEAN") || t.eq_ignore_ascii_case("IFCLOGICAL")
            });
            match (logical, e.as_str()) {
                (true, "T" | "TRUE") => CellValue::Boolean(true),
                (true, "F" | "FALSE") => CellValue::Boolean(false),
                (true, _) => CellValue::Null,
                (false, _) => CellValue::Text(e.clone()),
            }
        }
        AttributeValue::List(items) => join_values(items),
        _ => CellValue::Null,
    }
}

/// Collapse a value list: one value stays typed, several are joined as text.
fn join_values(items: &[AttributeValue]) -> CellValue {
    let mut values: Vec<CellValue> = items
        .iter()
        .map(cell_value)
        .filter(|value| !value.is_null())
        .collect();

    match values.len() {
        0 => CellValue::Null,
        1 => values.remove(0),
        _ => CellValue::Text(
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'Project',$,$,$,$,$,$);
#10=IFCBUILDINGSTOREY('2fVbY7rXz0Gv1$Z5y4Mlk3',$,'Level 1',$,$,$,$,$,.ELEMENT.,0.);
#20=IFCWALL('3vB2YO$MX4xv5uCqZZG05x',$,'Basic Wall; 200mm',$,'Basic Wall:Generic',$,$,'1001');
#21=IFCDOOR('1hOSvn6df7F8_7GcBWlRGQ',$,'Door \X2\00C1\X0\',$,$,$,$,'2001',2.1,0.9,$,$,$);
#22=IFCSLAB('0xScRe4drECQ4DMSqUjd6d',$,$,$,$,$,$,$,$);
#30=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#31=IFCPROPERTYSINGLEVALUE('FireRating',$,IFCLABEL('EI60'),$);
#32=IFCPROPERTYENUMERATEDVALUE('Status',$,(IFCLABEL('New'),IFCLABEL('Existing')),$);
#33=IFCPROPERTYSINGLEVALUE('LoadBearing',$,IFCLOGICAL(.U.),$);
#34=IFCPROPERTYSET('1Ty8jBXuP0ZgZ3lS8bW3nF',$,'Pset_WallCommon',$,(#30,#31,#32,#33));
#35=IFCRELDEFINESBYPROPERTIES('0r1Ckz9Ov1BwmKqHMcbD0l',$,$,$,(#20),#34);
#40=IFCQUANTITYLENGTH('Width',$,$,0.2,$);
#41=IFCQUANTITYCOUNT('Panels',$,$,3,$);
#42=IFCELEMENTQUANTITY('3Kx9TmYpH4eB1qNGDQjrfM',$,'Qto_WallBaseQuantities',$,$,(#40,#41));
#43=IFCRELDEFINESBYPROPERTIES('2q4zZz9Ov1BwmKqHMcbD0l',$,$,$,(#20,#22),#42);
#50=IFCPROPERTYSINGLEVALUE('FireRating',$,IFCLABEL('EI30'),$);
#51=IFCPROPERTYSINGLEVALUE('Manufacturer',$,IFCLABEL('Acme'),$);
#52=IFCPROPERTYSET('0Qf2q9Xe90Vh9fKd$N4sTk',$,'Pset_WallCommon',$,(#50,#51));
#53=IFCWALLTYPE('1Yq7Gf3c55MeLyUQWlfh5M',$,'Generic 200',$,$,(#52),$,$,$,.STANDARD.);
#54=IFCRELDEFINESBYTYPE('3T6sYk2iX8QwQm4KU3o7jT',$,$,$,(#20),#53);
#60=IFCRELCONTAINEDINSPATIALSTRUCTURE('1kE0C$Pq97o9R3hJ6aSxqN',$,$,$,(#20,#21),#10);
ENDSEC;
END-ISO-10303-21;
"#;

    fn extract() -> Table {
        let model = IfcModel::from_content(MODEL).unwrap();
        extract_elements(&model)
    }

    #[test]
    fn test_one_row_per_element() {
        let table = extract();
        assert_eq!(table.row_count(), 3);
        let types: Vec<String> = table
            .column_values(TYPE_COLUMN)
            .unwrap()
            .map(ToString::to_string)
            .collect();
        assert_eq!(types, ["IfcWall", "IfcDoor", "IfcSlab"]);
    }

    #[test]
    fn test_column_layout() {
        let table = extract();
        assert_eq!(
            table.columns(),
            [
                "GUID",
                "Name",
                "Type",
                "ObjectType",
                "Tag",
                "TypeName",
                "Storey",
                "Pset_WallCommon.FireRating",
                "Pset_WallCommon.IsExternal",
                "Pset_WallCommon.LoadBearing",
                "Pset_WallCommon.Manufacturer",
                "Pset_WallCommon.Status",
                "Qto_WallBaseQuantities.Panels",
                "Qto_WallBaseQuantities.Width",
            ]
        );
    }

    #[test]
    fn test_wall_properties() {
        let table = extract();
        let cell = |column: &str| table.cell(0, column).cloned().unwrap();

        assert_eq!(cell(GUID_COLUMN), CellValue::from("3vB2YO$MX4xv5uCqZZG05x"));
        assert_eq!(cell(NAME_COLUMN), CellValue::from("Basic Wall; 200mm"));
        assert_eq!(cell(TAG_COLUMN), CellValue::from("1001"));
        assert_eq!(cell(TYPE_NAME_COLUMN), CellValue::from("Generic 200"));
        assert_eq!(cell(STOREY_COLUMN), CellValue::from("Level 1"));
        // occurrence value overrides the type value
        assert_eq!(cell("Pset_WallCommon.FireRating"), CellValue::from("EI60"));
        // type-only property is inherited
        assert_eq!(cell("Pset_WallCommon.Manufacturer"), CellValue::from("Acme"));
        assert_eq!(cell("Pset_WallCommon.IsExternal"), CellValue::Boolean(true));
        assert_eq!(cell("Pset_WallCommon.LoadBearing"), CellValue::Null);
        assert_eq!(cell("Pset_WallCommon.Status"), CellValue::from("New, Existing"));
        assert_eq!(cell("Qto_WallBaseQuantities.Width"), CellValue::Number(0.2));
        assert_eq!(cell("Qto_WallBaseQuantities.Panels"), CellValue::Integer(3));
    }

    #[test]
    fn test_missing_values_are_null() {
        let table = extract();
        assert_eq!(table.cell(1, NAME_COLUMN), Some(&CellValue::from("Door Á")));
        assert_eq!(table.cell(1, "Pset_WallCommon.FireRating"), Some(&CellValue::Null));
        assert_eq!(table.cell(2, NAME_COLUMN), Some(&CellValue::Null));
        assert_eq!(table.cell(2, STOREY_COLUMN), Some(&CellValue::Null));
        assert_eq!(
            table.cell(2, "Qto_WallBaseQuantities.Width"),
            Some(&CellValue::Number(0.2))
        );
    }

    #[test]
    fn test_model_without_elements() {
        let model = IfcModel::from_content(
            "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1=IFCPROJECT('a',$,$,$,$,$,$,$,$);\nENDSEC;",
        )
        .unwrap();
        let table = extract_elements(&model);
        assert!(table.is_empty());
        assert_eq!(table.columns(), ["GUID", "Name", "Type"]);
    }

    #[test]
    fn test_storey_falls_back_to_long_name() {
        let model = IfcModel::from_content(concat!(
            "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n",
            "#1=IFCBUILDINGSTOREY('s',$,$,$,$,$,#9,'Ground Floor',.ELEMENT.,0.);\n",
            "#2=IFCWALL('w',$,'Wall',$,$,$,$,$);\n",
            "#3=IFCRELCONTAINEDINSPATIALSTRUCTURE('r',$,$,$,(#2),#1);\n",
            "ENDSEC;"
        ))
        .unwrap();
        let table = extract_elements(&model);
        assert_eq!(
            table.cell(0, STOREY_COLUMN),
            Some(&CellValue::from("Ground Floor"))
        );
    }
}
