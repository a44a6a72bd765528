//! Bridge generation demonstration
//!
//! This example imports a small hand-built module and prints the generated
//! C declarations and C-ABI entrypoints.

use bridgegen::semantic::SymbolTable;
use bridgegen::syntax::{
    DeclModifier, DeclSyntax, FuncDeclSyntax, InitDeclSyntax, NominalDeclSyntax, ParameterSyntax,
    SourceFileSyntax, TypeSyntax, VarDeclSyntax,
};
use bridgegen::thunk::render_thunk;
use bridgegen::types::NominalKind;
use bridgegen::visitor::DeclarationVisitor;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Bridge Generation Demo ===\n");

    // The symbol table is established once, before the walk.
    let mut symbols = SymbolTable::new("Demo");
    symbols.declare("Counter", NominalKind::Class);
    symbols.declare("Point", NominalKind::Struct);

    // public class Counter {
    //     public init(start: Int)
    //     public var value: Int
    //     public func bump()
    // }
    let counter = DeclSyntax::Nominal(NominalDeclSyntax {
        kind: NominalKind::Class,
        name: "Counter".to_string(),
        modifiers: vec![DeclModifier::Public],
        members: vec![
            DeclSyntax::Initializer(InitDeclSyntax {
                modifiers: vec![DeclModifier::Public],
                is_failable: false,
                parameters: vec![ParameterSyntax {
                    argument_label: Some("start".to_string()),
                    name: "start".to_string(),
                    ty: TypeSyntax::named("Int"),
                    is_inout: false,
                }],
                leading_trivia: None,
            }),
            DeclSyntax::Variable(VarDeclSyntax {
                name: "value".to_string(),
                modifiers: vec![DeclModifier::Public],
                annotation: Some(TypeSyntax::named("Int")),
                is_constant: false,
                leading_trivia: None,
            }),
            DeclSyntax::Function(FuncDeclSyntax {
                name: "bump".to_string(),
                modifiers: vec![DeclModifier::Public],
                parameters: vec![],
                return_clause: None,
                leading_trivia: None,
            }),
        ],
    });

    // public func sum(_ b: UnsafeBufferPointer<Int32>) -> Int
    let sum = DeclSyntax::Function(FuncDeclSyntax {
        name: "sum".to_string(),
        modifiers: vec![DeclModifier::Public],
        parameters: vec![ParameterSyntax {
            argument_label: None,
            name: "b".to_string(),
            ty: TypeSyntax::generic("UnsafeBufferPointer", vec![TypeSyntax::named("Int32")]),
            is_inout: false,
        }],
        return_clause: Some(TypeSyntax::named("Int")),
        leading_trivia: None,
    });

    let file = SourceFileSyntax {
        items: vec![counter, sum],
    };

    let mut visitor = DeclarationVisitor::new(&symbols);
    visitor.visit_source_file(&file)?;
    let module = visitor.finish();

    println!("--- C declarations ---");
    for function in &module.functions {
        println!("{}", function.c_function);
    }
    for ty in &module.types {
        for imported in ty
            .initializers
            .iter()
            .chain(&ty.methods)
            .chain(ty.variables.iter().map(|v| &v.getter))
            .chain(ty.variables.iter().filter_map(|v| v.setter.as_ref()))
        {
            println!("{}", imported.c_function);
        }
    }

    println!("\n--- Entrypoints ---");
    for function in &module.functions {
        println!(
            "{}\n",
            render_thunk(&function.cdecl_name, &function.lowered, &function.thunk)
        );
    }
    for ty in &module.types {
        for imported in ty
            .initializers
            .iter()
            .chain(&ty.methods)
            .chain(ty.variables.iter().map(|v| &v.getter))
            .chain(ty.variables.iter().filter_map(|v| v.setter.as_ref()))
        {
            println!(
                "{}\n",
                render_thunk(&imported.cdecl_name, &imported.lowered, &imported.thunk)
            );
        }
    }

    Ok(())
}
