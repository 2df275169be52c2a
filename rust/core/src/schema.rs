// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Schema knowledge needed for property reporting.
//!
//! - Catalogue of `IfcElement` subtypes across IFC2X3, IFC4 and IFC4X3, keyed
//!   by the upper-case STEP keyword and mapped to the schema spelling.
//! - Schema version detection from the STEP header.

use std::fmt;

/// `IfcElement` subtypes, sorted by STEP keyword for binary search.
static ELEMENT_TYPES: &[(&str, &str)] = &[
    ("IFCACTUATOR", "IfcActuator"),
    ("IFCAIRTERMINAL", "IfcAirTerminal"),
    ("IFCAIRTERMINALBOX", "IfcAirTerminalBox"),
    ("IFCAIRTOAIRHEATRECOVERY", "IfcAirToAirHeatRecovery"),
    ("IFCALARM", "IfcAlarm"),
    ("IFCAUDIOVISUALAPPLIANCE", "IfcAudioVisualAppliance"),
    ("IFCBEAM", "IfcBeam"),
    ("IFCBEAMSTANDARDCASE", "IfcBeamStandardCase"),
    ("IFCBEARING", "IfcBearing"),
    ("IFCBOILER", "IfcBoiler"),
    ("IFCBUILDINGELEMENTPART", "IfcBuildingElementPart"),
    ("IFCBUILDINGELEMENTPROXY", "IfcBuildingElementProxy"),
    ("IFCBURNER", "IfcBurner"),
    ("IFCCABLECARRIERFITTING", "IfcCableCarrierFitting"),
    ("IFCCABLECARRIERSEGMENT", "IfcCableCarrierSegment"),
    ("IFCCABLEFITTING", "IfcCableFitting"),
    ("IFCCABLESEGMENT", "IfcCableSegment"),
    ("IFCCHILLER", "IfcChiller"),
    ("IFCCHIMNEY", "IfcChimney"),
    ("IFCCIVILELEMENT", "IfcCivilElement"),
    ("IFCCOIL", "IfcCoil"),
    ("IFCCOLUMN", "IfcColumn"),
    ("IFCCOLUMNSTANDARDCASE", "IfcColumnStandardCase"),
    ("IFCCOMMUNICATIONSAPPLIANCE", "IfcCommunicationsAppliance"),
    ("IFCCOMPRESSOR", "IfcCompressor"),
    ("IFCCONDENSER", "IfcCondenser"),
    ("IFCCONTROLLER", "IfcController"),
    ("IFCCOOLEDBEAM", "IfcCooledBeam"),
    ("IFCCOOLINGTOWER", "IfcCoolingTower"),
    ("IFCCOURSE", "IfcCourse"),
    ("IFCCOVERING", "IfcCovering"),
    ("IFCCURTAINWALL", "IfcCurtainWall"),
    ("IFCDAMPER", "IfcDamper"),
    ("IFCDEEPFOUNDATION", "IfcDeepFoundation"),
    ("IFCDISCRETEACCESSORY", "IfcDiscreteAccessory"),
    ("IFCDISTRIBUTIONCHAMBERELEMENT", "IfcDistributionChamberElement"),
    ("IFCDISTRIBUTIONCONTROLELEMENT", "IfcDistributionControlElement"),
    ("IFCDISTRIBUTIONELEMENT", "IfcDistributionElement"),
    ("IFCDISTRIBUTIONFLOWELEMENT", "IfcDistributionFlowElement"),
    ("IFCDOOR", "IfcDoor"),
    ("IFCDOORSTANDARDCASE", "IfcDoorStandardCase"),
    ("IFCDUCTFITTING", "IfcDuctFitting"),
    ("IFCDUCTSEGMENT", "IfcDuctSegment"),
    ("IFCDUCTSILENCER", "IfcDuctSilencer"),
    ("IFCEARTHWORKSFILL", "IfcEarthworksFill"),
    ("IFCELECTRICAPPLIANCE", "IfcElectricAppliance"),
    ("IFCELECTRICDISTRIBUTIONBOARD", "IfcElectricDistributionBoard"),
    ("IFCELECTRICFLOWSTORAGEDEVICE", "IfcElectricFlowStorageDevice"),
    ("IFCELECTRICGENERATOR", "IfcElectricGenerator"),
    ("IFCELECTRICMOTOR", "IfcElectricMotor"),
    ("IFCELECTRICTIMECONTROL", "IfcElectricTimeControl"),
    ("IFCELEMENTASSEMBLY", "IfcElementAssembly"),
    ("IFCENERGYCONVERSIONDEVICE", "IfcEnergyConversionDevice"),
    ("IFCENGINE", "IfcEngine"),
    ("IFCEVAPORATIVECOOLER", "IfcEvaporativeCooler"),
    ("IFCEVAPORATOR", "IfcEvaporator"),
    ("IFCFAN", "IfcFan"),
    ("IFCFASTENER", "IfcFastener"),
    ("IFCFILTER", "IfcFilter"),
    ("IFCFIRESUPPRESSIONTERMINAL", "IfcFireSuppressionTerminal"),
    ("IFCFLOWCONTROLLER", "IfcFlowController"),
    ("IFCFLOWFITTING", "IfcFlowFitting"),
    ("IFCFLOWINSTRUMENT", "IfcFlowInstrument"),
    ("IFCFLOWMETER", "IfcFlowMeter"),
    ("IFCFLOWMOVINGDEVICE", "IfcFlowMovingDevice"),
    ("IFCFLOWSEGMENT", "IfcFlowSegment"),
    ("IFCFLOWSTORAGEDEVICE", "IfcFlowStorageDevice"),
    ("IFCFLOWTERMINAL", "IfcFlowTerminal"),
    ("IFCFLOWTREATMENTDEVICE", "IfcFlowTreatmentDevice"),
    ("IFCFOOTING", "IfcFooting"),
    ("IFCFURNISHINGELEMENT", "IfcFurnishingElement"),
    ("IFCFURNITURE", "IfcFurniture"),
    ("IFCGEOGRAPHICELEMENT", "IfcGeographicElement"),
    ("IFCHEATEXCHANGER", "IfcHeatExchanger"),
    ("IFCHUMIDIFIER", "IfcHumidifier"),
    ("IFCINTERCEPTOR", "IfcInterceptor"),
    ("IFCJUNCTIONBOX", "IfcJunctionBox"),
    ("IFCKERB", "IfcKerb"),
    ("IFCLAMP", "IfcLamp"),
    ("IFCLIGHTFIXTURE", "IfcLightFixture"),
    ("IFCMECHANICALFASTENER", "IfcMechanicalFastener"),
    ("IFCMEDICALDEVICE", "IfcMedicalDevice"),
    ("IFCMEMBER", "IfcMember"),
    ("IFCMEMBERSTANDARDCASE", "IfcMemberStandardCase"),
    ("IFCMOBILETELECOMMUNICATIONSAPPLIANCE", "IfcMobileTelecommunicationsAppliance"),
    ("IFCMOTORCONNECTION", "IfcMotorConnection"),
    ("IFCOPENINGELEMENT", "IfcOpeningElement"),
    ("IFCOPENINGSTANDARDCASE", "IfcOpeningStandardCase"),
    ("IFCOUTLET", "IfcOutlet"),
    ("IFCPAVEMENT", "IfcPavement"),
    ("IFCPILE", "IfcPile"),
    ("IFCPIPEFITTING", "IfcPipeFitting"),
    ("IFCPIPESEGMENT", "IfcPipeSegment"),
    ("IFCPLATE", "IfcPlate"),
    ("IFCPLATESTANDARDCASE", "IfcPlateStandardCase"),
    ("IFCPROTECTIVEDEVICE", "IfcProtectiveDevice"),
    ("IFCPROTECTIVEDEVICETRIPPINGUNIT", "IfcProtectiveDeviceTrippingUnit"),
    ("IFCPUMP", "IfcPump"),
    ("IFCRAILING", "IfcRailing"),
    ("IFCRAMP", "IfcRamp"),
    ("IFCRAMPFLIGHT", "IfcRampFlight"),
    ("IFCREINFORCINGBAR", "IfcReinforcingBar"),
    ("IFCREINFORCINGMESH", "IfcReinforcingMesh"),
    ("IFCROOF", "IfcRoof"),
    ("IFCSANITARYTERMINAL", "IfcSanitaryTerminal"),
    ("IFCSENSOR", "IfcSensor"),
    ("IFCSHADINGDEVICE", "IfcShadingDevice"),
    ("IFCSLAB", "IfcSlab"),
    ("IFCSLABELEMENTEDCASE", "IfcSlabElementedCase"),
    ("IFCSLABSTANDARDCASE", "IfcSlabStandardCase"),
    ("IFCSOLARDEVICE", "IfcSolarDevice"),
    ("IFCSPACEHEATER", "IfcSpaceHeater"),
    ("IFCSTACKTERMINAL", "IfcStackTerminal"),
    ("IFCSTAIR", "IfcStair"),
    ("IFCSTAIRFLIGHT", "IfcStairFlight"),
    ("IFCSWITCHINGDEVICE", "IfcSwitchingDevice"),
    ("IFCSYSTEMFURNITUREELEMENT", "IfcSystemFurnitureElement"),
    ("IFCTANK", "IfcTank"),
    ("IFCTENDON", "IfcTendon"),
    ("IFCTENDONANCHOR", "IfcTendonAnchor"),
    ("IFCTRANSFORMER", "IfcTransformer"),
    ("IFCTRANSPORTELEMENT", "IfcTransportElement"),
    ("IFCTUBEBUNDLE", "IfcTubeBundle"),
    ("IFCUNITARYCONTROLELEMENT", "IfcUnitaryControlElement"),
    ("IFCUNITARYEQUIPMENT", "IfcUnitaryEquipment"),
    ("IFCVALVE", "IfcValve"),
    ("IFCVIBRATIONISOLATOR", "IfcVibrationIsolator"),
    ("IFCVIRTUALELEMENT", "IfcVirtualElement"),
    ("IFCVOIDINGFEATURE", "IfcVoidingFeature"),
    ("IFCWALL", "IfcWall"),
    ("IFCWALLELEMENTEDCASE", "IfcWallElementedCase"),
    ("IFCWALLSTANDARDCASE", "IfcWallStandardCase"),
    ("IFCWASTETERMINAL", "IfcWasteTerminal"),
    ("IFCWINDOW", "IfcWindow"),
    ("IFCWINDOWSTANDARDCASE", "IfcWindowStandardCase"),
];

/// Schema spelling (`IfcWall`) of an element keyword, `None` for non-elements.
pub fn element_type_name(type_name: &str) -> Option<&'static str> {
    let upper = type_name.to_ascii_uppercase();
    ELEMENT_TYPES
        .binary_search_by(|(keyword, _)| (*keyword).cmp(upper.as_str()))
        .ok()
        .map(|index| ELEMENT_TYPES[index].1)
}

/// Check whether a keyword names an `IfcElement` subtype
#[inline]
pub fn is_element_type(type_name: &str) -> bool {
    element_type_name(type_name).is_some()
}

/// IFC schema version declared in `FILE_SCHEMA`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaVersion {
    Ifc2x3,
    Ifc4,
    Ifc4x3,
    Other(String),
}

impl SchemaVersion {
    /// Read the schema identifier from the STEP header.
    ///
    /// Falls back to a substring search when the header is missing or malformed.
    pub fn detect(content: &str) -> Self {
        let header_end = memchr::memmem::find(content.as_bytes(), b"DATA;").unwrap_or(content.len());
        let header = &content[..header_end];

        let declared = header.find("FILE_SCHEMA").and_then(|pos| {
            let rest = &header[pos..];
            let open = rest.find('\'')? + 1;
            let close = rest[open..].find('\'')? + open;
            Some(rest[open..close].trim().to_ascii_uppercase())
        });

        match declared {
            Some(name) => Self::from_identifier(&name),
            None if content.contains("IFC4X3") => SchemaVersion::Ifc4x3,
            None if content.contains("IFC4") => SchemaVersion::Ifc4,
            None if content.contains("IFC2X3") => SchemaVersion::Ifc2x3,
            None => SchemaVersion::Other(String::from("UNKNOWN")),
        }
    }

    fn from_identifier(name: &str) -> Self {
        if name.starts_with("IFC4X3") {
            SchemaVersion::Ifc4x3
        } else if name.starts_with("IFC4") {
            SchemaVersion::Ifc4
        } else if name.starts_with("IFC2X3") {
            SchemaVersion::Ifc2x3
        } else {
            SchemaVersion::Other(name.to_string())
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        match self {
            SchemaVersion::Ifc2x3 => "IFC2X3",
            SchemaVersion::Ifc4 => "IFC4",
            SchemaVersion::Ifc4x3 => "IFC4X3",
            SchemaVersion::Other(name) => name,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_is_sorted() {
        assert!(ELEMENT_TYPES.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(ELEMENT_TYPES
            .iter()
            .all(|(keyword, name)| name.to_ascii_uppercase() == *keyword));
    }

    #[test]
    fn test_element_lookup() {
        assert_eq!(element_type_name("IFCWALL"), Some("IfcWall"));
        assert_eq!(element_type_name("IfcDoor"), Some("IfcDoor"));
        assert_eq!(element_type_name("IFCFLOWTERMINAL"), Some("IfcFlowTerminal"));
        assert!(!is_element_type("IFCPROJECT"));
        assert!(!is_element_type("IFCPROPERTYSET"));
        assert!(!is_element_type("IFCBUILDINGSTOREY"));
    }

    #[test]
    fn test_schema_detection() {
        let ifc4 = "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n#1=IFCWALL('a',$,$,$,$,$,$,$);";
        assert_eq!(SchemaVersion::detect(ifc4), SchemaVersion::Ifc4);

        let ifc2x3 = "HEADER;FILE_SCHEMA(('IFC2X3'));ENDSEC;DATA;";
        assert_eq!(SchemaVersion::detect(ifc2x3).as_str(), "IFC2X3");

        let ifc4x3 = "HEADER;FILE_SCHEMA(('IFC4X3_ADD2'));ENDSEC;";
        assert_eq!(SchemaVersion::detect(ifc4x3), SchemaVersion::Ifc4x3);

        assert_eq!(SchemaVersion::detect("#1=IFCWALL();").as_str(), "UNKNOWN");
    }
}
