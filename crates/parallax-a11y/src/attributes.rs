//! Attributes
//!
//! The attribute bag carried by every node. Keys are camel-style
//! identifiers (`ariaChecked`, `acceptCharset`, `tabIndex`); the projected
//! element uses their wire form (`aria-checked`, `accept-charset`,
//! `tabindex`). An unset attribute is absent from the element.

use std::collections::BTreeMap;

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Str(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Self::Num(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    /// Plain string rendering (booleans as `true`/`false`)
    pub fn to_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Num(n) => format_number(*n),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self { Self::Str(value.to_string()) }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self { Self::Str(value) }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self { Self::Num(value) }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self { Self::Num(value as f64) }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self { Self::Bool(value) }
}

/// Format a number without a trailing `.0` for whole values
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Conversion between typed accessor values and [`AttrValue`]
pub trait AttrType: Sized {
    fn from_value(value: &AttrValue) -> Option<Self>;
    fn into_value(self) -> AttrValue;
}

impl AttrType for bool {
    fn from_value(value: &AttrValue) -> Option<Self> { value.as_bool() }
    fn into_value(self) -> AttrValue { AttrValue::Bool(self) }
}

impl AttrType for f64 {
    fn from_value(value: &AttrValue) -> Option<Self> { value.as_number() }
    fn into_value(self) -> AttrValue { AttrValue::Num(self) }
}

impl AttrType for i32 {
    fn from_value(value: &AttrValue) -> Option<Self> {
        value.as_number().filter(|n| n.fract() == 0.0).map(|n| n as i32)
    }
    fn into_value(self) -> AttrValue { AttrValue::Num(self as f64) }
}

impl AttrType for String {
    fn from_value(value: &AttrValue) -> Option<Self> { Some(value.to_text()) }
    fn into_value(self) -> AttrValue { AttrValue::Str(self) }
}

impl AttrType for AttrValue {
    fn from_value(value: &AttrValue) -> Option<Self> { Some(value.clone()) }
    fn into_value(self) -> AttrValue { self }
}

/// Translate a camel-style key into its wire name
///
/// `ariaValueNow` becomes `aria-valuenow`, `acceptCharset` becomes
/// `accept-charset`, everything else is lower-cased.
pub fn wire_name_for(key: &str) -> String {
    if let Some(rest) = key.strip_prefix("aria") {
        if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
            return format!("aria-{}", rest.to_ascii_lowercase());
        }
    }
    if key == "acceptCharset" {
        return "accept-charset".to_string();
    }
    if key == "httpEquiv" {
        return "http-equiv".to_string();
    }
    key.to_ascii_lowercase()
}

macro_rules! attrs {
    ($($variant:ident => $key:literal, $wire:literal;)*) => {
        /// Named attribute
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Attr {
            $($variant,)*
        }

        impl Attr {
            pub const ALL: &'static [Attr] = &[$(Attr::$variant,)*];

            /// Internal camel-style key
            pub fn key(&self) -> &'static str {
                match self { $(Attr::$variant => $key,)* }
            }

            /// Name on the projected element
            pub fn wire_name(&self) -> &'static str {
                match self { $(Attr::$variant => $wire,)* }
            }
        }
    };
}

attrs! {
    // ARIA states and properties
    AriaAtomic => "ariaAtomic", "aria-atomic";
    AriaAutocomplete => "ariaAutocomplete", "aria-autocomplete";
    AriaBusy => "ariaBusy", "aria-busy";
    AriaChecked => "ariaChecked", "aria-checked";
    AriaColCount => "ariaColCount", "aria-colcount";
    AriaColIndex => "ariaColIndex", "aria-colindex";
    AriaColSpan => "ariaColSpan", "aria-colspan";
    AriaCurrent => "ariaCurrent", "aria-current";
    AriaDescription => "ariaDescription", "aria-description";
    AriaExpanded => "ariaExpanded", "aria-expanded";
    AriaHasPopup => "ariaHasPopup", "aria-haspopup";
    AriaInvalid => "ariaInvalid", "aria-invalid";
    AriaKeyShortcuts => "ariaKeyShortcuts", "aria-keyshortcuts";
    AriaLabel => "ariaLabel", "aria-label";
    AriaLevel => "ariaLevel", "aria-level";
    AriaLive => "ariaLive", "aria-live";
    AriaModal => "ariaModal", "aria-modal";
    AriaMultiSelectable => "ariaMultiSelectable", "aria-multiselectable";
    AriaOrientation => "ariaOrientation", "aria-orientation";
    AriaPlaceholder => "ariaPlaceholder", "aria-placeholder";
    AriaPosInSet => "ariaPosInSet", "aria-posinset";
    AriaPressed => "ariaPressed", "aria-pressed";
    AriaReadOnly => "ariaReadOnly", "aria-readonly";
    AriaRequired => "ariaRequired", "aria-required";
    AriaRoleDescription => "ariaRoleDescription", "aria-roledescription";
    AriaRowCount => "ariaRowCount", "aria-rowcount";
    AriaRowIndex => "ariaRowIndex", "aria-rowindex";
    AriaRowSpan => "ariaRowSpan", "aria-rowspan";
    AriaSelected => "ariaSelected", "aria-selected";
    AriaSetSize => "ariaSetSize", "aria-setsize";
    AriaSort => "ariaSort", "aria-sort";
    AriaValueMax => "ariaValueMax", "aria-valuemax";
    AriaValueMin => "ariaValueMin", "aria-valuemin";
    AriaValueNow => "ariaValueNow", "aria-valuenow";
    AriaValueText => "ariaValueText", "aria-valuetext";

    // Global attributes
    AccessKey => "accessKey", "accesskey";
    Dir => "dir", "dir";
    Lang => "lang", "lang";
    TabIndex => "tabIndex", "tabindex";
    Title => "title", "title";

    // Element-specific attributes
    AcceptCharset => "acceptCharset", "accept-charset";
    Action => "action", "action";
    Alt => "alt", "alt";
    Autocomplete => "autocomplete", "autocomplete";
    Checked => "checked", "checked";
    ColSpan => "colSpan", "colspan";
    DateTime => "dateTime", "datetime";
    Headers => "headers", "headers";
    Href => "href", "href";
    Max => "max", "max";
    MaxLength => "maxLength", "maxlength";
    Method => "method", "method";
    Min => "min", "min";
    Multiple => "multiple", "multiple";
    Name => "name", "name";
    Open => "open", "open";
    Placeholder => "placeholder", "placeholder";
    ReadOnly => "readOnly", "readonly";
    Required => "required", "required";
    RowSpan => "rowSpan", "rowspan";
    Scope => "scope", "scope";
    Selected => "selected", "selected";
    Step => "step", "step";
    Type => "type", "type";
    Value => "value", "value";
}

impl Attr {
    /// Look up an attribute by its camel-style key
    pub fn from_key(key: &str) -> Option<Attr> {
        Attr::ALL.iter().copied().find(|a| a.key() == key)
    }

    /// ARIA state or property
    pub fn is_aria(&self) -> bool {
        self.wire_name().starts_with("aria-")
    }

    /// Project a value to its wire text. `None` means the attribute is
    /// left off the element.
    ///
    /// ARIA booleans serialize as `"true"`/`"false"`; HTML boolean
    /// attributes are present (empty value) when true and absent when false.
    pub fn project(&self, value: &AttrValue) -> Option<String> {
        match value {
            AttrValue::Bool(b) if self.is_aria() => Some(b.to_string()),
            AttrValue::Bool(true) => Some(String::new()),
            AttrValue::Bool(false) => None,
            AttrValue::Num(n) if n.is_nan() => None,
            AttrValue::Num(n) => Some(format_number(*n)),
            AttrValue::Str(s) => Some(s.clone()),
        }
    }
}

/// Attribute bag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: BTreeMap<Attr, AttrValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attr: Attr) -> Option<&AttrValue> {
        self.values.get(&attr)
    }

    pub fn set(&mut self, attr: Attr, value: impl Into<AttrValue>) {
        self.values.insert(attr, value.into());
    }

    /// Unset an attribute
    pub fn remove(&mut self, attr: Attr) -> Option<AttrValue> {
        self.values.remove(&attr)
    }

    pub fn contains(&self, attr: Attr) -> bool {
        self.values.contains_key(&attr)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attr, &AttrValue)> {
        self.values.iter().map(|(a, v)| (*a, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Wire-form attributes, skipping values that project to nothing
    pub fn projected(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .filter_map(|(attr, value)| attr.project(value).map(|v| (attr.wire_name().to_string(), v)))
            .collect()
    }

    fn typed<T: AttrType>(&self, attr: Attr) -> Option<T> {
        self.values.get(&attr).and_then(T::from_value)
    }
}

macro_rules! accessors {
    ($($get:ident / $set:ident : $attr:ident => $ty:ty;)*) => {
        impl Attributes {
            $(
                pub fn $get(&self) -> Option<$ty> {
                    self.typed::<$ty>(Attr::$attr)
                }

                pub fn $set(&mut self, value: impl Into<$ty>) {
                    self.values.insert(Attr::$attr, <$ty as AttrType>::into_value(value.into()));
                }
            )*
        }
    };
}

accessors! {
    label / set_label: AriaLabel => String;
    description / set_description: AriaDescription => String;
    role_description / set_role_description: AriaRoleDescription => String;
    aria_checked / set_aria_checked: AriaChecked => bool;
    pressed / set_pressed: AriaPressed => bool;
    expanded / set_expanded: AriaExpanded => bool;
    aria_selected / set_aria_selected: AriaSelected => bool;
    aria_read_only / set_aria_read_only: AriaReadOnly => bool;
    aria_required / set_aria_required: AriaRequired => bool;
    invalid / set_invalid: AriaInvalid => bool;
    modal / set_modal: AriaModal => bool;
    busy / set_busy: AriaBusy => bool;
    atomic / set_atomic: AriaAtomic => bool;
    multi_selectable / set_multi_selectable: AriaMultiSelectable => bool;
    has_popup / set_has_popup: AriaHasPopup => String;
    live / set_live: AriaLive => String;
    current / set_current: AriaCurrent => String;
    orientation / set_orientation: AriaOrientation => String;
    sort / set_sort: AriaSort => String;
    key_shortcuts / set_key_shortcuts: AriaKeyShortcuts => String;
    level / set_level: AriaLevel => i32;
    pos_in_set / set_pos_in_set: AriaPosInSet => i32;
    size_of_set / set_size_of_set: AriaSetSize => i32;
    col_index / set_col_index: AriaColIndex => i32;
    row_index / set_row_index: AriaRowIndex => i32;
    col_count / set_col_count: AriaColCount => i32;
    row_count / set_row_count: AriaRowCount => i32;
    value_now / set_value_now: AriaValueNow => f64;
    value_min / set_value_min: AriaValueMin => f64;
    value_max / set_value_max: AriaValueMax => f64;
    value_text / set_value_text: AriaValueText => String;
    tab_index / set_tab_index: TabIndex => i32;
    lang / set_lang: Lang => String;
    dir / set_dir: Dir => String;
    title / set_title: Title => String;
    access_key / set_access_key: AccessKey => String;
    checked / set_checked: Checked => bool;
    value / set_value: Value => AttrValue;
    min / set_min: Min => f64;
    max / set_max: Max => f64;
    step / set_step: Step => f64;
    input_type / set_input_type: Type => String;
    placeholder / set_placeholder: Placeholder => String;
    read_only / set_read_only: ReadOnly => bool;
    required / set_required: Required => bool;
    selected / set_selected: Selected => bool;
    col_span / set_col_span: ColSpan => i32;
    row_span / set_row_span: RowSpan => i32;
    scope / set_scope: Scope => String;
    href / set_href: Href => String;
    accept_charset / set_accept_charset: AcceptCharset => String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_keys() {
        for attr in Attr::ALL {
            assert_eq!(wire_name_for(attr.key()), attr.wire_name(), "{:?}", attr);
        }
        assert_eq!(wire_name_for("ariaValueNow"), "aria-valuenow");
        assert_eq!(wire_name_for("acceptCharset"), "accept-charset");
        assert_eq!(wire_name_for("tabIndex"), "tabindex");
    }

    #[test]
    fn test_boolean_projection() {
        assert_eq!(Attr::Checked.project(&AttrValue::Bool(true)), Some(String::new()));
        assert_eq!(Attr::Checked.project(&AttrValue::Bool(false)), None);
        assert_eq!(Attr::AriaExpanded.project(&AttrValue::Bool(false)), Some("false".into()));
    }

    #[test]
    fn test_number_projection() {
        assert_eq!(Attr::Value.project(&AttrValue::Num(3.0)), Some("3".into()));
        assert_eq!(Attr::Value.project(&AttrValue::Num(2.5)), Some("2.5".into()));
        assert_eq!(Attr::TabIndex.project(&AttrValue::Num(-1.0)), Some("-1".into()));
    }

    #[test]
    fn test_typed_accessors() {
        let mut attrs = Attributes::new();
        assert_eq!(attrs.checked(), None);
        attrs.set_checked(true);
        attrs.set_label("Accept");
        attrs.set_tab_index(-1);
        attrs.set_value(4.0);

        assert_eq!(attrs.checked(), Some(true));
        assert_eq!(attrs.label().as_deref(), Some("Accept"));
        assert_eq!(attrs.tab_index(), Some(-1));
        assert_eq!(attrs.value().and_then(|v| v.as_number()), Some(4.0));

        attrs.remove(Attr::TabIndex);
        assert_eq!(attrs.tab_index(), None);
    }

    #[test]
    fn test_unset_is_absent() {
        let mut attrs = Attributes::new();
        attrs.set_checked(false);
        attrs.set_expanded(true);
        let projected = attrs.projected();
        assert_eq!(projected, vec![("aria-expanded".to_string(), "true".to_string())]);
    }
}
