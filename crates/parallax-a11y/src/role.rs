//! Role Registry
//!
//! Static mapping from a role to the element tag it projects to, whether it
//! needs an explicit `role` attribute, the roles it accepts as direct
//! children, and its behavioural [`Capability`].

use std::fmt;
use std::sync::OnceLock;

use crate::A11yError;
use crate::capability::{self, Capability};

macro_rules! roles {
    ($($variant:ident => $name:literal, $aria:literal, $tag:literal, $explicit:literal;)*) => {
        /// Accessibility role
        ///
        /// WAI-ARIA roles plus the table section roles, a few text-level
        /// pseudo roles, the `Format*` inline formatting roles and `None`,
        /// a grouping role with no semantic role attribute.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Role {
            $($variant,)*
        }

        impl Role {
            /// Every role, in declaration order
            pub const ALL: &'static [Role] = &[$(Role::$variant,)*];

            /// Upper-case identifier used in diagnostics
            pub fn name(&self) -> &'static str {
                match self { $(Role::$variant => $name,)* }
            }

            /// ARIA role token
            pub fn aria_name(&self) -> &'static str {
                match self { $(Role::$variant => $aria,)* }
            }

            fn projection(&self) -> (&'static str, bool) {
                match self { $(Role::$variant => ($tag, $explicit),)* }
            }
        }
    };
}

roles! {
    // Landmarks
    Banner => "BANNER", "banner", "header", false;
    Complementary => "COMPLEMENTARY", "complementary", "aside", false;
    ContentInfo => "CONTENTINFO", "contentinfo", "footer", false;
    Form => "FORM", "form", "form", false;
    Main => "MAIN", "main", "main", false;
    Navigation => "NAVIGATION", "navigation", "nav", false;
    Region => "REGION", "region", "section", false;
    Search => "SEARCH", "search", "div", true;

    // Live regions
    Alert => "ALERT", "alert", "div", true;
    Log => "LOG", "log", "div", true;
    Marquee => "MARQUEE", "marquee", "div", true;
    Status => "STATUS", "status", "output", false;
    Timer => "TIMER", "timer", "div", true;

    // Windows
    AlertDialog => "ALERTDIALOG", "alertdialog", "div", true;
    Dialog => "DIALOG", "dialog", "div", true;
    Tooltip => "TOOLTIP", "tooltip", "div", true;

    // Widgets
    Button => "BUTTON", "button", "button", false;
    Checkbox => "CHECKBOX", "checkbox", "input", false;
    Combobox => "COMBOBOX", "combobox", "input", true;
    Grid => "GRID", "grid", "table", true;
    GridCell => "GRIDCELL", "gridcell", "td", true;
    Link => "LINK", "link", "a", false;
    Listbox => "LISTBOX", "listbox", "div", true;
    Menu => "MENU", "menu", "ul", true;
    MenuBar => "MENUBAR", "menubar", "ul", true;
    MenuItem => "MENUITEM", "menuitem", "li", true;
    MenuItemCheckbox => "MENUITEMCHECKBOX", "menuitemcheckbox", "li", true;
    MenuItemRadio => "MENUITEMRADIO", "menuitemradio", "li", true;
    Meter => "METER", "meter", "meter", false;
    Option => "OPTION", "option", "div", true;
    ProgressBar => "PROGRESSBAR", "progressbar", "progress", false;
    Radio => "RADIO", "radio", "input", false;
    RadioGroup => "RADIOGROUP", "radiogroup", "div", true;
    ScrollBar => "SCROLLBAR", "scrollbar", "div", true;
    SearchBox => "SEARCHBOX", "searchbox", "input", false;
    Slider => "SLIDER", "slider", "input", false;
    SpinButton => "SPINBUTTON", "spinbutton", "input", false;
    Switch => "SWITCH", "switch", "input", true;
    Tab => "TAB", "tab", "button", true;
    TabList => "TABLIST", "tablist", "div", true;
    TabPanel => "TABPANEL", "tabpanel", "div", true;
    TextBox => "TEXTBOX", "textbox", "input", false;
    Tree => "TREE", "tree", "ul", true;
    TreeGrid => "TREEGRID", "treegrid", "table", true;
    TreeItem => "TREEITEM", "treeitem", "li", true;

    // Document structure
    Application => "APPLICATION", "application", "div", true;
    Article => "ARTICLE", "article", "article", false;
    Blockquote => "BLOCKQUOTE", "blockquote", "blockquote", false;
    Caption => "CAPTION", "caption", "caption", false;
    Cell => "CELL", "cell", "td", false;
    Code => "CODE", "code", "code", false;
    ColumnHeader => "COLUMNHEADER", "columnheader", "th", false;
    Definition => "DEFINITION", "definition", "dd", false;
    Deletion => "DELETION", "deletion", "del", false;
    Document => "DOCUMENT", "document", "div", true;
    Emphasis => "EMPHASIS", "emphasis", "em", false;
    Feed => "FEED", "feed", "div", true;
    Figure => "FIGURE", "figure", "figure", false;
    Group => "GROUP", "group", "div", true;
    Heading => "HEADING", "heading", "div", true;
    Img => "IMG", "img", "div", true;
    Insertion => "INSERTION", "insertion", "ins", false;
    List => "LIST", "list", "ul", false;
    ListItem => "LISTITEM", "listitem", "li", false;
    Math => "MATH", "math", "math", false;
    Note => "NOTE", "note", "div", true;
    Paragraph => "PARAGRAPH", "paragraph", "p", false;
    Row => "ROW", "row", "tr", false;
    RowHeader => "ROWHEADER", "rowheader", "th", false;
    Separator => "SEPARATOR", "separator", "hr", false;
    Strong => "STRONG", "strong", "strong", false;
    Subscript => "SUBSCRIPT", "subscript", "sub", false;
    Superscript => "SUPERSCRIPT", "superscript", "sup", false;
    Table => "TABLE", "table", "table", false;
    TableHead => "TABLEHEAD", "rowgroup", "thead", false;
    TableBody => "TABLEBODY", "rowgroup", "tbody", false;
    TableFoot => "TABLEFOOT", "rowgroup", "tfoot", false;
    Term => "TERM", "term", "dfn", false;
    Time => "TIME", "time", "time", false;
    Toolbar => "TOOLBAR", "toolbar", "div", true;

    // Text-level pseudo roles
    None => "NONE", "none", "div", false;
    Label => "LABEL", "label", "label", false;
    Text => "TEXT", "text", "span", false;
    TextArea => "TEXTAREA", "textbox", "textarea", false;
    LineBreak => "LINEBREAK", "none", "br", false;

    // Inline formatting
    FormatBold => "FORMAT_BOLD", "none", "b", false;
    FormatItalic => "FORMAT_ITALIC", "none", "i", false;
    FormatUnderline => "FORMAT_UNDERLINE", "none", "u", false;
    FormatStrikethrough => "FORMAT_STRIKETHROUGH", "none", "s", false;
    FormatMark => "FORMAT_MARK", "mark", "mark", false;
    FormatSmall => "FORMAT_SMALL", "none", "small", false;
    FormatAbbr => "FORMAT_ABBR", "none", "abbr", false;
    FormatCite => "FORMAT_CITE", "none", "cite", false;
    FormatKbd => "FORMAT_KBD", "none", "kbd", false;
    FormatQuote => "FORMAT_QUOTE", "none", "q", false;
    FormatPre => "FORMAT_PRE", "none", "pre", false;
}

impl Role {
    /// Parse a role from its identifier or ARIA token (case-insensitive)
    pub fn from_name(value: &str) -> Result<Role, A11yError> {
        let value = value.trim();
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(value))
            .or_else(|| {
                Role::ALL
                    .iter()
                    .copied()
                    .find(|r| r.aria_name().eq_ignore_ascii_case(value) && r.aria_name() != "none")
            })
            .ok_or_else(|| A11yError::UnknownRole(value.to_string()))
    }

    /// Table sections (`thead`, `tbody`, `tfoot`)
    pub fn is_section(&self) -> bool {
        matches!(self, Self::TableHead | Self::TableBody | Self::TableFoot)
    }

    /// Composite 2-D widgets driven by the grid navigator
    pub fn is_grid(&self) -> bool {
        matches!(self, Self::Grid | Self::TreeGrid)
    }

    /// Roles that occupy a cell slot inside a row
    pub fn is_cell(&self) -> bool {
        matches!(self, Self::Cell | Self::GridCell | Self::ColumnHeader | Self::RowHeader)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Roles a parent accepts as direct children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Children {
    /// No restriction
    Any,
    /// Only the listed roles
    Only(&'static [Role]),
    /// No children at all
    Leaf,
}

impl Children {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            Self::Any => true,
            Self::Only(roles) => roles.contains(&role),
            Self::Leaf => false,
        }
    }

    /// Permitted roles sorted by name, empty for `Any`
    pub fn listed(&self) -> Vec<Role> {
        let mut roles = match self {
            Self::Only(roles) => roles.to_vec(),
            Self::Any | Self::Leaf => Vec::new(),
        };
        roles.sort_by_key(|r| r.name());
        roles
    }
}

const TABLE_SECTIONS: &[Role] = &[Role::TableHead, Role::TableBody, Role::TableFoot];
const ROW_CELLS: &[Role] = &[Role::Cell, Role::GridCell, Role::ColumnHeader, Role::RowHeader];
const MENU_ITEMS: &[Role] = &[
    Role::MenuItem, Role::MenuItemCheckbox, Role::MenuItemRadio, Role::Group, Role::Separator,
];
const MENU_ITEM_PARTS: &[Role] = &[Role::Menu, Role::MenuItem, Role::Text, Role::Label, Role::Img, Role::None];
const TREE_ITEM_PARTS: &[Role] = &[Role::Group, Role::Text, Role::Label, Role::Img, Role::None];

fn permitted_children(role: Role) -> Children {
    use Role::*;
    match role {
        Table | Grid | TreeGrid => Children::Only(TABLE_SECTIONS),
        TableHead | TableBody | TableFoot => Children::Only(&[Row]),
        Row => Children::Only(ROW_CELLS),
        List => Children::Only(&[ListItem]),
        Menu | MenuBar => Children::Only(MENU_ITEMS),
        MenuItem => Children::Only(MENU_ITEM_PARTS),
        Listbox => Children::Only(&[Option, Group]),
        TabList => Children::Only(&[Tab]),
        Tree => Children::Only(&[TreeItem, Group]),
        TreeItem => Children::Only(TREE_ITEM_PARTS),
        RadioGroup => Children::Only(&[Radio, Label, Text, None]),
        Feed => Children::Only(&[Article]),
        Checkbox | Radio | Switch | TextBox | TextArea | SearchBox | Slider | SpinButton
        | ProgressBar | Meter | Separator | LineBreak | ScrollBar | Img | Combobox
        | MenuItemCheckbox | MenuItemRadio => Children::Leaf,
        _ => Children::Any,
    }
}

/// Registry entry for one role
#[derive(Debug, Clone)]
pub struct RoleEntry {
    pub role: Role,
    pub tag: &'static str,
    pub explicit_role: bool,
    pub children: Children,
    pub capability: Capability,
}

/// Role registry
///
/// Built once and shared; no mutable state.
#[derive(Debug)]
pub struct RoleRegistry {
    entries: Vec<RoleEntry>,
}

impl RoleRegistry {
    /// The process-wide standard registry
    pub fn standard() -> &'static RoleRegistry {
        static REGISTRY: OnceLock<RoleRegistry> = OnceLock::new();
        REGISTRY.get_or_init(RoleRegistry::build)
    }

    fn build() -> Self {
        let entries = Role::ALL
            .iter()
            .map(|&role| {
                let (tag, explicit_role) = role.projection();
                RoleEntry {
                    role,
                    tag,
                    explicit_role,
                    children: permitted_children(role),
                    capability: capability::for_role(role),
                }
            })
            .collect();
        Self { entries }
    }

    /// Registry entry (every role has one)
    pub fn entry(&self, role: Role) -> &RoleEntry {
        &self.entries[role as usize]
    }

    /// Element tag the role projects to
    pub fn tag_for(&self, role: Role) -> &'static str {
        self.entry(role).tag
    }

    pub fn permitted_children(&self, role: Role) -> Children {
        self.entry(role).children
    }

    /// Check whether `child` may be nested directly under `parent`
    pub fn permits(&self, parent: Role, child: Role) -> bool {
        self.entry(parent).children.permits(child)
    }

    /// Whether the projected element carries a `role` attribute
    pub fn emits_role_attribute(&self, role: Role) -> bool {
        self.entry(role).explicit_role
    }

    pub fn capability(&self, role: Role) -> &Capability {
        &self.entry(role).capability
    }
}
