//! Declaration visitor
//!
//! A read-only walk over a parsed source file that selects the public
//! classes, structs, extensions, methods, initializers, and properties,
//! lowers each through the signature pipeline, and collects the results into
//! per-type import buckets. One declaration failing to lower never stops the
//! walk; the failure is logged and its siblings continue.

use crate::error::{ImportError, ImportResult, LoweringError};
use crate::ffi::{project_function, CFunction};
use crate::lowering::{LoweredFunctionSignature, LoweringEngine};
use crate::semantic::SymbolTable;
use crate::signature::FunctionSignature;
use crate::syntax::{
    mangled_name_hint, DeclModifier, DeclSyntax, ExtensionDeclSyntax, FuncDeclSyntax,
    InitDeclSyntax, NominalDeclSyntax, SourceFileSyntax, VarDeclSyntax,
};
use crate::thunk::{assemble_call, assemble_getter, assemble_setter, ThunkBody};
use crate::types::{NominalType, SwiftType};
use tracing::{info, warn};

/// One imported function, initializer, or property accessor
#[derive(Debug, Clone)]
pub struct ImportedFunc {
    pub name: String,
    /// Synthesized stable symbol name of the C-ABI entrypoint
    pub cdecl_name: String,
    pub mangled_name: Option<String>,
    pub signature: FunctionSignature,
    pub lowered: LoweredFunctionSignature,
    pub c_function: CFunction,
    pub thunk: ThunkBody,
}

/// One imported property with its accessor entrypoints
#[derive(Debug, Clone)]
pub struct ImportedVariable {
    pub name: String,
    pub mangled_name: Option<String>,
    pub getter: ImportedFunc,
    /// Absent for `let` bindings
    pub setter: Option<ImportedFunc>,
}

/// Import bucket of one nominal type
#[derive(Debug, Clone)]
pub struct ImportedType {
    pub ty: NominalType,
    pub initializers: Vec<ImportedFunc>,
    pub methods: Vec<ImportedFunc>,
    pub variables: Vec<ImportedVariable>,
}

impl ImportedType {
    fn new(ty: NominalType) -> Self {
        Self {
            ty,
            initializers: Vec::new(),
            methods: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.initializers.is_empty() && self.methods.is_empty() && self.variables.is_empty()
    }
}

/// Everything imported from one module
#[derive(Debug, Clone)]
pub struct ImportedModule {
    pub name: String,
    pub types: Vec<ImportedType>,
    /// Module-scope functions
    pub functions: Vec<ImportedFunc>,
    /// Structured per-declaration failures that did not stop the walk
    pub skipped: Vec<ImportError>,
}

/// Read-only traversal that feeds importable declarations to the lowering engine
pub struct DeclarationVisitor<'a> {
    symbols: &'a SymbolTable,
    engine: LoweringEngine<'a>,
    module: ImportedModule,
}

impl<'a> DeclarationVisitor<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            engine: LoweringEngine::new(symbols.known()),
            module: ImportedModule {
                name: symbols.module_name().to_string(),
                types: Vec::new(),
                functions: Vec::new(),
                skipped: Vec::new(),
            },
        }
    }

    /// Walk a source file, collecting importable declarations
    ///
    /// Only programmer-invariant violations abort the walk.
    pub fn visit_source_file(&mut self, file: &SourceFileSyntax) -> ImportResult<()> {
        for item in &file.items {
            self.visit_decl(item, None)?;
        }
        Ok(())
    }

    /// Consume the visitor, yielding the imported module
    pub fn finish(self) -> ImportedModule {
        self.module
    }

    fn visit_decl(&mut self, decl: &DeclSyntax, enclosing: Option<&NominalType>) -> ImportResult<()> {
        match decl {
            DeclSyntax::Nominal(nominal) => self.visit_nominal(nominal, enclosing),
            DeclSyntax::Extension(extension) => self.visit_extension(extension),
            DeclSyntax::Function(function) => {
                self.visit_function(function, enclosing);
                Ok(())
            }
            DeclSyntax::Initializer(initializer) => self.visit_initializer(initializer, enclosing),
            DeclSyntax::Variable(variable) => self.visit_variable(variable, enclosing),
            DeclSyntax::Deinitializer => Ok(()),
        }
    }

    fn visit_nominal(
        &mut self,
        decl: &NominalDeclSyntax,
        enclosing: Option<&NominalType>,
    ) -> ImportResult<()> {
        if !decl.modifiers.contains(&DeclModifier::Public) {
            return Ok(());
        }
        let qualified = match enclosing {
            Some(outer) => format!("{}.{}", outer.decl.qualified_name(), decl.name),
            None => decl.name.clone(),
        };
        let Some(handle) = self.symbols.lookup(&qualified) else {
            info!(name = %qualified, "skipping nominal unknown to the symbol table");
            return Ok(());
        };
        let ty = NominalType::new(handle.clone());
        for member in &decl.members {
            self.visit_decl(member, Some(&ty))?;
        }
        Ok(())
    }

    fn visit_extension(&mut self, decl: &ExtensionDeclSyntax) -> ImportResult<()> {
        // Extensions carry no modifier of their own; visibility comes from
        // the extended type, so resolving it is the import gate.
        let ty = match self.symbols.resolve(&decl.extended_type) {
            Ok(SwiftType::Nominal(nominal)) => nominal,
            _ => {
                info!(extended = %decl.extended_type, "skipping extension of unknown type");
                return Ok(());
            }
        };
        for member in &decl.members {
            self.visit_decl(member, Some(&ty))?;
        }
        Ok(())
    }

    fn visit_function(&mut self, decl: &FuncDeclSyntax, enclosing: Option<&NominalType>) {
        if !decl.modifiers.contains(&DeclModifier::Public) {
            return;
        }
        let imported = FunctionSignature::from_function(decl, enclosing, self.symbols)
            .and_then(|signature| {
                let callee = match enclosing {
                    Some(ty) if signature.is_static => {
                        format!("{}.{}", ty.decl.qualified_name(), decl.name)
                    }
                    _ => decl.name.clone(),
                };
                let cdecl_name = self.cdecl_symbol_name(enclosing, &decl.name, &signature);
                self.import_function(&decl.name, &callee, cdecl_name, signature, decl.leading_trivia.as_deref())
            });
        match imported {
            Ok(imported) => self.attach(imported, enclosing),
            Err(error) => self.skip(&decl.name, error),
        }
    }

    fn visit_initializer(
        &mut self,
        decl: &InitDeclSyntax,
        enclosing: Option<&NominalType>,
    ) -> ImportResult<()> {
        let Some(enclosing) = enclosing else {
            return Err(ImportError::InitializerOutsideNominal);
        };
        if !decl.modifiers.contains(&DeclModifier::Public) {
            return Ok(());
        }
        if decl.is_failable {
            warn!(ty = %enclosing.decl.qualified_name(), "skipping failable initializer");
            return Ok(());
        }
        let imported = FunctionSignature::from_initializer(decl, enclosing, self.symbols)
            .and_then(|signature| {
                let callee = enclosing.decl.qualified_name();
                let cdecl_name = self.cdecl_symbol_name(Some(enclosing), "init", &signature);
                self.import_function("init", &callee, cdecl_name, signature, decl.leading_trivia.as_deref())
            });
        match imported {
            Ok(imported) => {
                self.bucket(enclosing).initializers.push(imported);
            }
            Err(error) => self.skip("init", error),
        }
        Ok(())
    }

    fn visit_variable(
        &mut self,
        decl: &VarDeclSyntax,
        enclosing: Option<&NominalType>,
    ) -> ImportResult<()> {
        let Some(enclosing) = enclosing else {
            // Structured error instead of a fatal path so callers can keep
            // importing the rest of the module.
            warn!(name = %decl.name, "skipping unsupported global property");
            self.module
                .skipped
                .push(ImportError::UnsupportedGlobalVariable(decl.name.clone()));
            return Ok(());
        };
        if !decl.modifiers.contains(&DeclModifier::Public) {
            return Ok(());
        }

        let accessor_callee = if decl.is_static_or_class() {
            format!("{}.{}", enclosing.decl.qualified_name(), decl.name)
        } else {
            decl.name.clone()
        };
        let trivia = decl.leading_trivia.as_deref();

        let getter = FunctionSignature::getter(decl, Some(enclosing), self.symbols).and_then(
            |signature| {
                let lowered = self.engine.lower_function_signature(&signature)?;
                let cdecl_name = self.accessor_symbol_name(enclosing, &decl.name, "get");
                let c_function = project_function(&cdecl_name, &lowered)?;
                let thunk = assemble_getter(&lowered, &accessor_callee);
                Ok(ImportedFunc {
                    name: decl.name.clone(),
                    cdecl_name,
                    mangled_name: trivia.and_then(mangled_name_hint).map(str::to_string),
                    signature,
                    lowered,
                    c_function,
                    thunk,
                })
            },
        );
        let getter = match getter {
            Ok(getter) => getter,
            Err(error) => {
                self.skip(&decl.name, error);
                return Ok(());
            }
        };

        let setter = if decl.is_constant {
            None
        } else {
            let setter = FunctionSignature::setter(decl, Some(enclosing), self.symbols).and_then(
                |signature| {
                    let lowered = self.engine.lower_function_signature(&signature)?;
                    let cdecl_name = self.accessor_symbol_name(enclosing, &decl.name, "set");
                    let c_function = project_function(&cdecl_name, &lowered)?;
                    let thunk = assemble_setter(&lowered, &accessor_callee);
                    Ok(ImportedFunc {
                        name: decl.name.clone(),
                        cdecl_name,
                        mangled_name: trivia.and_then(mangled_name_hint).map(str::to_string),
                        signature,
                        lowered,
                        c_function,
                        thunk,
                    })
                },
            );
            match setter {
                Ok(setter) => Some(setter),
                Err(error) => {
                    self.skip(&decl.name, error);
                    return Ok(());
                }
            }
        };

        self.bucket(enclosing).variables.push(ImportedVariable {
            name: decl.name.clone(),
            mangled_name: trivia.and_then(mangled_name_hint).map(str::to_string),
            getter,
            setter,
        });
        Ok(())
    }

    /// Run one signature through lowering, projection, and assembly
    fn import_function(
        &self,
        name: &str,
        callee: &str,
        cdecl_name: String,
        signature: FunctionSignature,
        trivia: Option<&str>,
    ) -> Result<ImportedFunc, LoweringError> {
        let lowered = self.engine.lower_function_signature(&signature)?;
        let c_function = project_function(&cdecl_name, &lowered)?;
        let thunk = assemble_call(&lowered, callee);
        Ok(ImportedFunc {
            name: name.to_string(),
            cdecl_name,
            mangled_name: trivia.and_then(mangled_name_hint).map(str::to_string),
            signature,
            lowered,
            c_function,
            thunk,
        })
    }

    /// Synthesize the stable ASCII symbol name of an entrypoint
    ///
    /// Module, enclosing type path, declaration name, and argument labels,
    /// joined by underscores.
    fn cdecl_symbol_name(
        &self,
        enclosing: Option<&NominalType>,
        name: &str,
        signature: &FunctionSignature,
    ) -> String {
        let mut symbol = self.module.name.clone();
        if let Some(ty) = enclosing {
            symbol.push('_');
            symbol.push_str(&ty.decl.qualified_name().replace('.', "_"));
        }
        symbol.push('_');
        symbol.push_str(name);
        for (index, parameter) in signature.parameters.iter().enumerate() {
            symbol.push('_');
            match &parameter.argument_label {
                Some(label) => symbol.push_str(label),
                None => symbol.push_str(&parameter.name_or_index(index)),
            }
        }
        symbol
    }

    /// Accessor entrypoints carry the property name plus `get`/`set`
    fn accessor_symbol_name(&self, enclosing: &NominalType, name: &str, suffix: &str) -> String {
        format!(
            "{}_{}_{}_{}",
            self.module.name,
            enclosing.decl.qualified_name().replace('.', "_"),
            name,
            suffix
        )
    }

    fn attach(&mut self, imported: ImportedFunc, enclosing: Option<&NominalType>) {
        match enclosing {
            Some(enclosing) => self.bucket(enclosing).methods.push(imported),
            None => self.module.functions.push(imported),
        }
    }

    fn bucket(&mut self, ty: &NominalType) -> &mut ImportedType {
        let position = self
            .module
            .types
            .iter()
            .position(|imported| imported.ty == *ty);
        match position {
            Some(position) => &mut self.module.types[position],
            None => {
                self.module.types.push(ImportedType::new(ty.clone()));
                self.module.types.last_mut().unwrap()
            }
        }
    }

    fn skip(&self, name: &str, error: LoweringError) {
        info!(name = %name, error = %error, "skipping declaration that cannot be lowered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{DeclModifier, ParameterSyntax, TypeSyntax};
    use crate::types::NominalKind;

    fn symbols() -> SymbolTable {
        let mut table = SymbolTable::new("Demo");
        table.declare("Counter", NominalKind::Class);
        table.declare("Point", NominalKind::Struct);
        table
    }

    fn public_func(name: &str, parameters: Vec<ParameterSyntax>, ret: Option<TypeSyntax>) -> FuncDeclSyntax {
        FuncDeclSyntax {
            name: name.to_string(),
            modifiers: vec![DeclModifier::Public],
            parameters,
            return_clause: ret,
            leading_trivia: None,
        }
    }

    #[test]
    fn test_global_function_import() {
        let table = symbols();
        let mut visitor = DeclarationVisitor::new(&table);
        let file = SourceFileSyntax {
            items: vec![DeclSyntax::Function(public_func(
                "add",
                vec![
                    ParameterSyntax {
                        argument_label: None,
                        name: "x".to_string(),
                        ty: TypeSyntax::named("Int32"),
                        is_inout: false,
                    },
                    ParameterSyntax {
                        argument_label: None,
                        name: "y".to_string(),
                        ty: TypeSyntax::named("Int32"),
                        is_inout: false,
                    },
                ],
                Some(TypeSyntax::named("Int32")),
            ))],
        };
        visitor.visit_source_file(&file).unwrap();
        let module = visitor.finish();

        assert_eq!(module.functions.len(), 1);
        let imported = &module.functions[0];
        assert_eq!(imported.cdecl_name, "Demo_add_x_y");
        assert_eq!(format!("{}", imported.thunk), "return add(x, y)");
        assert_eq!(
            format!("{}", imported.c_function),
            "int32_t Demo_add_x_y(int32_t x, int32_t y);"
        );
    }

    #[test]
    fn test_non_public_declarations_produce_no_output() {
        let table = symbols();
        let mut visitor = DeclarationVisitor::new(&table);
        let file = SourceFileSyntax {
            items: vec![
                DeclSyntax::Function(FuncDeclSyntax {
                    name: "hidden".to_string(),
                    modifiers: vec![],
                    parameters: vec![],
                    return_clause: None,
                    leading_trivia: None,
                }),
                DeclSyntax::Nominal(NominalDeclSyntax {
                    kind: NominalKind::Class,
                    name: "Counter".to_string(),
                    modifiers: vec![],
                    members: vec![DeclSyntax::Function(public_func("bump", vec![], None))],
                }),
            ],
        };
        visitor.visit_source_file(&file).unwrap();
        let module = visitor.finish();

        assert!(module.functions.is_empty());
        assert!(module.types.is_empty());
    }

    #[test]
    fn test_initializer_outside_nominal_is_fatal() {
        let table = symbols();
        let mut visitor = DeclarationVisitor::new(&table);
        let file = SourceFileSyntax {
            items: vec![DeclSyntax::Initializer(InitDeclSyntax {
                modifiers: vec![DeclModifier::Public],
                is_failable: false,
                parameters: vec![],
                leading_trivia: None,
            })],
        };
        assert_eq!(
            visitor.visit_source_file(&file),
            Err(ImportError::InitializerOutsideNominal)
        );
    }

    #[test]
    fn test_global_variable_is_recorded_not_fatal() {
        let table = symbols();
        let mut visitor = DeclarationVisitor::new(&table);
        let file = SourceFileSyntax {
            items: vec![DeclSyntax::Variable(VarDeclSyntax {
                name: "shared".to_string(),
                modifiers: vec![DeclModifier::Public],
                annotation: Some(TypeSyntax::named("Int")),
                is_constant: false,
                leading_trivia: None,
            })],
        };
        visitor.visit_source_file(&file).unwrap();
        let module = visitor.finish();
        assert_eq!(
            module.skipped,
            vec![ImportError::UnsupportedGlobalVariable("shared".to_string())]
        );
    }

    #[test]
    fn test_unlowerable_declaration_skips_but_continues() {
        let table = symbols();
        let mut visitor = DeclarationVisitor::new(&table);
        let file = SourceFileSyntax {
            items: vec![
                DeclSyntax::Function(public_func(
                    "callback",
                    vec![ParameterSyntax {
                        argument_label: None,
                        name: "f".to_string(),
                        ty: TypeSyntax::Function {
                            parameters: vec![],
                            result: Box::new(TypeSyntax::named("Void")),
                        },
                        is_inout: false,
                    }],
                    None,
                )),
                DeclSyntax::Function(public_func("ping", vec![], None)),
            ],
        };
        visitor.visit_source_file(&file).unwrap();
        let module = visitor.finish();

        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].name, "ping");
    }

    #[test]
    fn test_extension_members_attach_to_extended_type() {
        let table = symbols();
        let mut visitor = DeclarationVisitor::new(&table);
        let file = SourceFileSyntax {
            items: vec![DeclSyntax::Extension(ExtensionDeclSyntax {
                extended_type: TypeSyntax::named("Counter"),
                members: vec![DeclSyntax::Function(public_func("bump", vec![], None))],
            })],
        };
        visitor.visit_source_file(&file).unwrap();
        let module = visitor.finish();

        assert_eq!(module.types.len(), 1);
        assert_eq!(module.types[0].ty.decl.name, "Counter");
        assert_eq!(module.types[0].methods.len(), 1);
        assert_eq!(
            format!("{}", module.types[0].methods[0].thunk),
            "unsafeBitCast(self, to: Counter.self).bump()"
        );
    }
}
