//! Land-cover class tables.

use std::collections::{BTreeMap, HashMap};

use raster_io::{ColorTable, Rgba};
use serde::{Deserialize, Serialize};
use sits_common::{SitsError, SitsResult};

/// Attribute the CORINE vector layers carry their class code in.
pub const CLC2012_ATTRIBUTE: &str = "code_12";

/// One class of a land-cover nomenclature.
///
/// Index 0 is reserved for NODATA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandCoverClass {
    pub index: u8,
    pub title: String,
    pub colour: Rgba,
    /// Source attribute name to class code.
    pub attrib: BTreeMap<String, String>,
}

impl LandCoverClass {
    pub fn new(index: u8, title: impl Into<String>, colour: Rgba) -> Self {
        Self {
            index,
            title: title.into(),
            colour,
            attrib: BTreeMap::new(),
        }
    }

    pub fn with_attrib(mut self, attribute: impl Into<String>, code: impl Into<String>) -> Self {
        self.attrib.insert(attribute.into(), code.into());
        self
    }

    /// The class code used in report labels.
    pub fn code(&self) -> &str {
        self.attrib.values().next().map(String::as_str).unwrap_or_default()
    }
}

/// An ordered list of classes with unique indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTable {
    name: String,
    classes: Vec<LandCoverClass>,
}

impl ClassTable {
    pub fn new(name: impl Into<String>, classes: Vec<LandCoverClass>) -> SitsResult<Self> {
        let name = name.into();
        if classes.is_empty() {
            return Err(SitsError::InvalidParameter {
                param: "classes".to_string(),
                message: format!("class table '{}' is empty", name),
            });
        }
        let mut seen = [false; 256];
        for class in &classes {
            if std::mem::replace(&mut seen[class.index as usize], true) {
                return Err(SitsError::InvalidParameter {
                    param: "classes".to_string(),
                    message: format!("duplicate class index {} in '{}'", class.index, name),
                });
            }
        }
        Ok(Self { name, classes })
    }

    /// Look up a bundled table by its configuration name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "clc2012" | "clc2012_classes" => Some(Self::clc2012()),
            _ => None,
        }
    }

    /// CORINE Land Cover 2012 nomenclature.
    pub fn clc2012() -> Self {
        let classes = CLC2012
            .iter()
            .map(|&(index, title, colour, code)| {
                LandCoverClass::new(index, title, colour).with_attrib(CLC2012_ATTRIBUTE, code)
            })
            .collect();
        Self {
            name: "clc2012".to_string(),
            classes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classes(&self) -> &[LandCoverClass] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn max_index(&self) -> u8 {
        self.classes.iter().map(|c| c.index).max().unwrap_or(0)
    }

    /// Map from the code under `attribute` to its class. Classes without
    /// the attribute are left out.
    pub fn lookup(&self, attribute: &str) -> HashMap<&str, &LandCoverClass> {
        self.classes
            .iter()
            .filter_map(|c| c.attrib.get(attribute).map(|code| (code.as_str(), c)))
            .collect()
    }

    /// Palette with every class colour set on top of the transparent base.
    pub fn color_table(&self) -> ColorTable {
        let mut table = ColorTable::new();
        for class in &self.classes {
            table.set(class.index, class.colour);
        }
        table
    }
}

const OPAQUE: u8 = 255;

#[rustfmt::skip]
const CLC2012: [(u8, &str, Rgba, &str); 47] = [
    (1, "Continuous urban fabric", (230, 0, 77, OPAQUE), "111"),
    (2, "Discontinuous urban fabric", (255, 0, 0, OPAQUE), "112"),
    (3, "Industrial or commercial units", (204, 77, 242, OPAQUE), "121"),
    (4, "Road and rail networks and associated land", (204, 0, 0, OPAQUE), "122"),
    (5, "Port areas", (230, 204, 204, OPAQUE), "123"),
    (6, "Airports", (230, 204, 230, OPAQUE), "124"),
    (7, "Mineral extraction sites", (166, 0, 204, OPAQUE), "131"),
    (8, "Dump sites", (166, 77, 0, OPAQUE), "132"),
    (9, "Construction sites", (255, 77, 255, OPAQUE), "133"),
    (10, "Green urban areas", (255, 166, 255, OPAQUE), "141"),
    (11, "Sport and leisure facilities", (255, 230, 255, OPAQUE), "142"),
    (12, "Non-irrigated arable land", (255, 255, 168, OPAQUE), "211"),
    (13, "Permanently irrigated land", (255, 255, 0, OPAQUE), "212"),
    (14, "Rice fields", (230, 230, 0, OPAQUE), "213"),
    (15, "Vineyards", (230, 128, 0, OPAQUE), "221"),
    (16, "Fruit trees and berry plantations", (242, 166, 77, OPAQUE), "222"),
    (17, "Olive groves", (230, 166, 0, OPAQUE), "223"),
    (18, "Pastures", (230, 230, 77, OPAQUE), "231"),
    (19, "Annual crops associated with permanent crops", (255, 230, 166, OPAQUE), "241"),
    (20, "Complex cultivation patterns", (255, 230, 77, OPAQUE), "242"),
    (21, "Land principally occupied by agriculture with significant areas of natural vegetation", (230, 204, 77, OPAQUE), "243"),
    (22, "Agro-forestry areas", (242, 204, 166, OPAQUE), "244"),
    (23, "Broad-leaved forest", (128, 255, 0, OPAQUE), "311"),
    (24, "Coniferous forest", (0, 166, 0, OPAQUE), "312"),
    (25, "Mixed forest", (77, 255, 0, OPAQUE), "313"),
    (26, "Natural grasslands", (204, 242, 77, OPAQUE), "321"),
    (27, "Moors and heathland", (166, 255, 128, OPAQUE), "322"),
    (28, "Sclerophyllous vegetation", (166, 230, 77, OPAQUE), "323"),
    (29, "Transitional woodland-shrub", (166, 242, 0, OPAQUE), "324"),
    (30, "Beaches - dunes - sands", (230, 230, 230, OPAQUE), "331"),
    (31, "Bare rocks", (204, 204, 204, OPAQUE), "332"),
    (32, "Sparsely vegetated areas", (204, 255, 204, OPAQUE), "333"),
    (33, "Burnt areas", (0, 0, 0, OPAQUE), "334"),
    (34, "Glaciers and perpetual snow", (166, 230, 204, OPAQUE), "335"),
    (35, "Inland marshes", (166, 166, 255, OPAQUE), "411"),
    (36, "Peat bogs", (77, 77, 255, OPAQUE), "412"),
    (37, "Salt marshes", (204, 204, 255, OPAQUE), "421"),
    (38, "Salines", (230, 230, 255, OPAQUE), "422"),
    (39, "Intertidal flats", (166, 166, 230, OPAQUE), "423"),
    (40, "Water courses", (0, 204, 242, OPAQUE), "511"),
    (41, "Water bodies", (128, 242, 230, OPAQUE), "512"),
    (42, "Coastal lagoons", (0, 255, 166, OPAQUE), "521"),
    (43, "Estuaries", (166, 255, 230, OPAQUE), "522"),
    (44, "Sea and ocean", (230, 242, 255, OPAQUE), "523"),
    (49, "UNCLASSIFIED LAND SURFACE", (255, 255, 255, OPAQUE), "990"),
    (50, "UNCLASSIFIED WATER BODIES", (230, 242, 255, OPAQUE), "995"),
    (0, "NODATA", (255, 255, 255, OPAQUE), "999"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clc2012_table() {
        let table = ClassTable::clc2012();
        assert_eq!(table.len(), 47);
        assert_eq!(table.max_index(), 50);
        // validates index uniqueness
        assert!(ClassTable::new("copy", table.classes().to_vec()).is_ok());
        let last = table.classes().last().unwrap();
        assert_eq!((last.index, last.code()), (0, "999"));
    }

    #[test]
    fn test_lookup_by_code() {
        let table = ClassTable::clc2012();
        let lookup = table.lookup(CLC2012_ATTRIBUTE);
        assert_eq!(lookup["112"].index, 2);
        assert_eq!(lookup["523"].title, "Sea and ocean");
        assert!(table.lookup("code_06").is_empty());
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let classes = vec![
            LandCoverClass::new(1, "a", (0, 0, 0, 255)),
            LandCoverClass::new(1, "b", (0, 0, 0, 255)),
        ];
        assert!(ClassTable::new("dup", classes).is_err());
        assert!(ClassTable::new("empty", Vec::new()).is_err());
    }

    #[test]
    fn test_color_table() {
        let colors = ClassTable::clc2012().color_table();
        assert_eq!(colors.get(2), (255, 0, 0, 255));
        assert_eq!(colors.get(45), (0, 0, 0, 0));
        assert_eq!(colors.get(0), (255, 255, 255, 255));
    }

    #[test]
    fn test_by_name() {
        assert!(ClassTable::by_name("CLC2012").is_some());
        assert!(ClassTable::by_name("clc2006").is_none());
    }
}
